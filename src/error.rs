//! Error types for the Unisearch library.
//!
//! All failures are represented by [`UnisearchError`]. Every variant maps to a
//! stable [`ErrorKind`] which is what callers see in a failed
//! [`SearchResponse`](crate::search::response::SearchResponse); the raw error
//! (transport failures included) never crosses the dispatcher boundary.
//!
//! # Examples
//!
//! ```
//! use unisearch::error::{ErrorKind, UnisearchError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(UnisearchError::invalid_request("page must be >= 1"))
//! }
//!
//! let err = example_operation().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidRequest);
//! ```

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::types::BackendKind;

/// The main error type for Unisearch operations.
#[derive(Error, Debug)]
pub enum UnisearchError {
    /// The request was rejected before any backend was contacted.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A backend call failed.
    #[error("{backend} backend unavailable: {message}")]
    BackendUnavailable {
        backend: BackendKind,
        message: String,
    },

    /// A backend call exceeded its deadline.
    #[error("{backend} backend timed out after {timeout_ms}ms")]
    BackendTimeout { backend: BackendKind, timeout_ms: u64 },

    /// The embedding length does not match the vector index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O errors (config and corpus files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with UnisearchError.
pub type Result<T> = std::result::Result<T, UnisearchError>;

/// Stable, caller-visible classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRequest,
    BackendUnavailable,
    BackendTimeout,
    DimensionMismatch,
    InvalidConfig,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::BackendUnavailable => "BackendUnavailable",
            ErrorKind::BackendTimeout => "BackendTimeout",
            ErrorKind::DimensionMismatch => "DimensionMismatch",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

impl UnisearchError {
    /// Create a new invalid request error.
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        UnisearchError::InvalidRequest(msg.into())
    }

    /// Create a new backend unavailable error.
    pub fn unavailable<S: Into<String>>(backend: BackendKind, msg: S) -> Self {
        UnisearchError::BackendUnavailable {
            backend,
            message: msg.into(),
        }
    }

    /// Create a new backend timeout error.
    pub fn timeout(backend: BackendKind, timeout_ms: u64) -> Self {
        UnisearchError::BackendTimeout {
            backend,
            timeout_ms,
        }
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        UnisearchError::DimensionMismatch { expected, actual }
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        UnisearchError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        UnisearchError::Other(msg.into())
    }

    /// The stable kind reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UnisearchError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            UnisearchError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            UnisearchError::BackendTimeout { .. } => ErrorKind::BackendTimeout,
            UnisearchError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            UnisearchError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            UnisearchError::Io(_) | UnisearchError::Json(_) | UnisearchError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether this error may be absorbed by the partial-failure policy.
    ///
    /// A dimension mismatch makes vector results meaningless, so it is never
    /// recoverable even when the other backend succeeded.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UnisearchError::BackendUnavailable { .. } | UnisearchError::BackendTimeout { .. }
        )
    }
}
