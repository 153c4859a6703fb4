//! # Unisearch
//!
//! A single search entry point over two independent backends: a lexical
//! full-text index and a vector index of image embeddings.
//!
//! ## Features
//!
//! - Lexical-only, vector-only, or hybrid requests
//! - Concurrent backend calls with per-backend timeouts
//! - Graceful degradation when one backend of a hybrid request fails
//! - Per-backend min-max score normalization and weighted fusion
//! - Deduplication by business key (canonical file path)
//! - Deterministic ranking and stable pagination
//! - In-memory and OpenSearch backend adapters

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;

pub mod prelude {
    pub use crate::backend::{BackendKind, LexicalClient, SearchHit, SearchMode, VectorClient};
    pub use crate::config::SearchConfig;
    pub use crate::error::{ErrorKind, Result, UnisearchError};
    pub use crate::search::{
        MergedResult, QueryDispatcher, QueryType, SearchRequest, SearchResponse, Weighting,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
