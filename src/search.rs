//! Query fan-out and result merging.
//!
//! A request flows through the modules in this order:
//!
//! 1. [`request`] validates it and picks the backend set.
//! 2. [`dispatcher`] calls the backends concurrently, each under its own
//!    timeout, and applies the partial-failure policy.
//! 3. [`normalizer`] rescales each backend's scores into `[0, 1]`.
//! 4. [`merger`] groups hits by [`key`], combines weighted scores and ranks.
//! 5. [`paginator`] cuts out the requested page.
//! 6. [`response`] wraps the page (or the error) for the caller.

pub mod dispatcher;
pub mod key;
pub mod merger;
pub mod normalizer;
pub mod paginator;
pub mod request;
pub mod response;

pub use dispatcher::{BackendOutcome, QueryDispatcher};
pub use key::BusinessKeyRule;
pub use merger::{MergedResult, ResultMerger};
pub use normalizer::{NormalizedHit, ScoreNormalizer};
pub use paginator::{Page, Paginator};
pub use request::{QueryType, SearchPlan, SearchRequest, Weighting};
pub use response::{BackendHitCounts, ErrorBody, SearchData, SearchResponse};
