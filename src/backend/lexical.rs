//! Lexical (full-text) backend interface.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::backend::types::{SearchFilter, SearchHit, SearchMode};
use crate::error::Result;

/// Client for a full-text search backend.
///
/// Implementations hold a reusable connection or session and must not keep
/// per-request state: the dispatcher may call `search` concurrently from
/// independent requests.
///
/// Errors are reported as `BackendUnavailable` or `BackendTimeout`.
#[async_trait]
pub trait LexicalClient: Send + Sync + Debug {
    /// Run `query` with the given term operator and return at most `size`
    /// hits that pass `filter`.
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        filter: &SearchFilter,
        size: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "lexical"
    }
}
