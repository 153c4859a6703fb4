//! Query dispatcher.
//!
//! Classifies a request, calls the required backends concurrently with an
//! independent timeout each, applies the partial-failure policy and hands
//! the surviving hits to the normalizer, merger and paginator.

use std::time::{Duration, Instant};

use futures::future::OptionFuture;
use log::{debug, info, warn};
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use uuid::Uuid;

use crate::backend::lexical::LexicalClient;
use crate::backend::types::{BackendKind, SearchFilter, SearchHit, SearchMode};
use crate::backend::vector::VectorClient;
use crate::config::SearchConfig;
use crate::error::{Result, UnisearchError};
use crate::search::key::BusinessKeyRule;
use crate::search::merger::ResultMerger;
use crate::search::normalizer::ScoreNormalizer;
use crate::search::paginator::Paginator;
use crate::search::request::{QueryType, SearchPlan, SearchRequest};
use crate::search::response::{BackendHitCounts, SearchData, SearchResponse};

/// Settled result of one backend call.
#[derive(Debug)]
pub enum BackendOutcome {
    /// The call returned hits (possibly none).
    Succeeded(Vec<SearchHit>),
    /// The call failed or timed out.
    Failed(UnisearchError),
}

impl BackendOutcome {
    fn settle(
        backend: BackendKind,
        limit: Duration,
        result: std::result::Result<Result<Vec<SearchHit>>, Elapsed>,
    ) -> Self {
        match result {
            Ok(Ok(hits)) => BackendOutcome::Succeeded(hits),
            Ok(Err(error)) => BackendOutcome::Failed(Self::classify(backend, error)),
            Err(_) => BackendOutcome::Failed(UnisearchError::timeout(
                backend,
                limit.as_millis() as u64,
            )),
        }
    }

    /// Keep backend error kinds as they are and wrap anything else so that no
    /// raw client error escapes the dispatcher.
    fn classify(backend: BackendKind, error: UnisearchError) -> UnisearchError {
        match error {
            UnisearchError::BackendUnavailable { .. }
            | UnisearchError::BackendTimeout { .. }
            | UnisearchError::DimensionMismatch { .. } => error,
            other => UnisearchError::unavailable(backend, other.to_string()),
        }
    }
}

/// Top-level search orchestrator.
///
/// Owns one client per backend. Clients are injected at construction and are
/// only read afterwards, so a dispatcher can serve concurrent requests.
#[derive(Debug)]
pub struct QueryDispatcher {
    config: SearchConfig,
    lexical: Box<dyn LexicalClient>,
    vector: Box<dyn VectorClient>,
    normalizer: ScoreNormalizer,
    merger: ResultMerger,
}

impl QueryDispatcher {
    /// Create a dispatcher.
    ///
    /// Fails if the configuration is invalid or the vector client's dimension
    /// differs from `config.vector_dimension`.
    pub fn new(
        config: SearchConfig,
        lexical: Box<dyn LexicalClient>,
        vector: Box<dyn VectorClient>,
    ) -> Result<Self> {
        config.validate()?;
        if vector.dimension() != config.vector_dimension {
            return Err(UnisearchError::invalid_config(format!(
                "vector backend '{}' has dimension {}, configuration expects {}",
                vector.name(),
                vector.dimension(),
                config.vector_dimension
            )));
        }

        let merger = ResultMerger::new(BusinessKeyRule::new(&config.business_key)?);

        Ok(Self {
            config,
            lexical,
            vector,
            normalizer: ScoreNormalizer::new(),
            merger,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute a search and return the requested page.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchData> {
        let plan = SearchPlan::from_request(request, &self.config)?;
        let request_id = Uuid::new_v4();
        let start = Instant::now();

        debug!(
            "[{request_id}] dispatching {} search (page {}, size {})",
            plan.query_type, plan.page, plan.page_size
        );

        let filter = &plan.filter;
        let lexical_call = OptionFuture::from(plan.lexical_query.map(|q| {
            self.call_lexical(q, plan.search_mode, filter, plan.lexical_fetch_size)
        }));
        let vector_call = OptionFuture::from(
            plan.embedding
                .map(|e| self.call_vector(e, filter, plan.vector_fetch_size)),
        );
        let (lexical_outcome, vector_outcome) = tokio::join!(lexical_call, vector_call);

        let mut hit_counts = BackendHitCounts::default();
        let mut lexical_hits = Vec::new();
        let mut vector_hits = Vec::new();
        let mut failures: Vec<(BackendKind, UnisearchError)> = Vec::new();

        for (backend, outcome, hits) in [
            (BackendKind::Lexical, lexical_outcome, &mut lexical_hits),
            (BackendKind::Vector, vector_outcome, &mut vector_hits),
        ] {
            match outcome {
                Some(BackendOutcome::Succeeded(found)) => {
                    hit_counts.set(backend, found.len());
                    *hits = found;
                }
                Some(BackendOutcome::Failed(error)) => {
                    warn!("[{request_id}] {backend} backend failed: {error}");
                    failures.push((backend, error));
                }
                None => {}
            }
        }

        let failed_backend = Self::apply_failure_policy(plan.query_type, failures)?;
        if let Some(backend) = failed_backend {
            warn!("[{request_id}] degrading to partial results without the {backend} backend");
        }

        let merged = self.merger.merge(
            self.normalizer.normalize(lexical_hits),
            self.normalizer.normalize(vector_hits),
            &plan.weighting,
        );
        let page = Paginator::new(plan.page, plan.page_size).paginate(merged);

        info!(
            "[{request_id}] {} search: lexical={} vector={} merged={} returned={} partial={} in {:.1}ms",
            plan.query_type,
            hit_counts.lexical,
            hit_counts.vector,
            page.total,
            page.items.len(),
            failed_backend.is_some(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(SearchData {
            results: page.items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            query_type: plan.query_type,
            backend_hit_counts: hit_counts,
            partial: failed_backend.is_some(),
            failed_backend,
        })
    }

    /// Execute a search and wrap the outcome in a response envelope.
    pub async fn handle(&self, request: &SearchRequest) -> SearchResponse {
        SearchResponse::from(self.search(request).await)
    }

    /// Parse a JSON request body and execute it.
    pub async fn handle_json(&self, body: &str) -> SearchResponse {
        match serde_json::from_str::<SearchRequest>(body) {
            Ok(request) => self.handle(&request).await,
            Err(e) => SearchResponse::failure(&UnisearchError::invalid_request(format!(
                "malformed request body: {e}"
            ))),
        }
    }

    /// Decide whether the request survives the settled failures.
    ///
    /// Returns the backend to report as failed when a hybrid request degrades.
    fn apply_failure_policy(
        query_type: QueryType,
        mut failures: Vec<(BackendKind, UnisearchError)>,
    ) -> Result<Option<BackendKind>> {
        if let Some(index) = failures
            .iter()
            .position(|(_, e)| matches!(e, UnisearchError::DimensionMismatch { .. }))
        {
            return Err(failures.swap_remove(index).1);
        }

        match (query_type, failures.len()) {
            (_, 0) => Ok(None),
            (QueryType::Hybrid, 1) => Ok(failures.pop().map(|(backend, _)| backend)),
            (QueryType::Hybrid, _) => {
                let all_timed_out = failures
                    .iter()
                    .all(|(_, e)| matches!(e, UnisearchError::BackendTimeout { .. }));
                let message = failures
                    .iter()
                    .map(|(_, e)| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                if all_timed_out {
                    Err(failures.swap_remove(0).1)
                } else {
                    let backend = failures
                        .iter()
                        .find(|(_, e)| !matches!(e, UnisearchError::BackendTimeout { .. }))
                        .map(|(backend, _)| *backend)
                        .unwrap_or(BackendKind::Lexical);
                    Err(UnisearchError::unavailable(
                        backend,
                        format!("all backends failed: {message}"),
                    ))
                }
            }
            (_, _) => Err(failures.swap_remove(0).1),
        }
    }

    async fn call_lexical(
        &self,
        query: &str,
        mode: SearchMode,
        filter: &SearchFilter,
        size: usize,
    ) -> BackendOutcome {
        let limit = self.config.lexical_timeout();
        let started = Instant::now();
        let outcome = BackendOutcome::settle(
            BackendKind::Lexical,
            limit,
            timeout(limit, self.lexical.search(query, mode, filter, size)).await,
        );
        debug!(
            "{} answered in {:.1}ms",
            self.lexical.name(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        outcome
    }

    async fn call_vector(&self, embedding: &[f32], filter: &SearchFilter, k: usize) -> BackendOutcome {
        let limit = self.config.vector_timeout();
        let started = Instant::now();
        let outcome = BackendOutcome::settle(
            BackendKind::Vector,
            limit,
            timeout(limit, self.vector.search(embedding, filter, k)).await,
        );
        debug!(
            "{} answered in {:.1}ms",
            self.vector.name(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        outcome
    }
}
