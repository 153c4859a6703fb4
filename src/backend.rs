//! Backend client interfaces and their adapters.
//!
//! The dispatcher only sees the two traits in [`lexical`] and [`vector`];
//! [`memory`] and [`opensearch`] are the concrete adapters shipped with the
//! crate.

pub mod lexical;
pub mod memory;
pub mod opensearch;
pub mod types;
pub mod vector;

pub use lexical::LexicalClient;
pub use types::{BackendKind, FILE_TYPE_FIELD, SearchFilter, SearchHit, SearchMode};
pub use vector::VectorClient;
