//! Vector (nearest-neighbor) backend interface.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::backend::types::{SearchFilter, SearchHit};
use crate::error::Result;

/// Client for an approximate-nearest-neighbor backend over fixed-width
/// embeddings.
///
/// Errors are reported as `BackendUnavailable`, `BackendTimeout`, or
/// `DimensionMismatch` when `embedding.len() != self.dimension()`.
#[async_trait]
pub trait VectorClient: Send + Sync + Debug {
    /// Return the `k` nearest neighbors of `embedding` among the documents
    /// that pass `filter`.
    async fn search(
        &self,
        embedding: &[f32],
        filter: &SearchFilter,
        k: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Dimension the backend index was built with.
    fn dimension(&self) -> usize;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "vector"
    }
}
