//! Search requests and their validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::types::{BackendKind, SearchFilter, SearchMode};
use crate::config::SearchConfig;
use crate::error::{Result, UnisearchError};

/// Relative weight of each backend in the combined score.
///
/// Weights are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weighting {
    pub lexical_weight: f32,
    pub vector_weight: f32,
}

impl Weighting {
    pub fn new(lexical_weight: f32, vector_weight: f32) -> Self {
        Self {
            lexical_weight,
            vector_weight,
        }
    }

    /// Weight applied to scores from the given backend.
    pub fn weight(&self, backend: BackendKind) -> f32 {
        match backend {
            BackendKind::Lexical => self.lexical_weight,
            BackendKind::Vector => self.vector_weight,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexicalWeight", self.lexical_weight),
            ("vectorWeight", self.vector_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(UnisearchError::invalid_request(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

impl From<&SearchConfig> for Weighting {
    fn from(config: &SearchConfig) -> Self {
        Self::new(config.lexical_weight, config.vector_weight)
    }
}

/// Which backends a request is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Lexical,
    Vector,
    Hybrid,
}

impl QueryType {
    pub fn uses(&self, backend: BackendKind) -> bool {
        match self {
            QueryType::Hybrid => true,
            QueryType::Lexical => backend == BackendKind::Lexical,
            QueryType::Vector => backend == BackendKind::Vector,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryType::Lexical => "lexical",
            QueryType::Vector => "vector",
            QueryType::Hybrid => "hybrid",
        })
    }
}

fn default_page() -> i64 {
    1
}

/// Caller-supplied search request.
///
/// Deserializes from the wire shape
/// `{ q, searchMode, embedding, page, pageSize, weighting }`. Page numbers are
/// signed so that non-positive values are reported as an invalid request
/// rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Full-text query.
    #[serde(default, rename = "q", skip_serializing_if = "Option::is_none")]
    pub lexical_query: Option<String>,

    /// Term operator; the configured default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,

    /// Query embedding for the vector backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// 1-indexed page number.
    #[serde(default = "default_page")]
    pub page: i64,

    /// Results per page; the configured default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,

    /// Per-request weight override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighting: Option<Weighting>,

    /// Restrict both backends to one file extension, e.g. `"pdf"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            lexical_query: None,
            search_mode: None,
            embedding: None,
            page: default_page(),
            page_size: None,
            weighting: None,
            file_type: None,
        }
    }
}

impl SearchRequest {
    /// Create a lexical-only request.
    pub fn lexical<S: Into<String>>(query: S) -> Self {
        Self {
            lexical_query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Create a vector-only request.
    pub fn vector(embedding: Vec<f32>) -> Self {
        Self {
            embedding: Some(embedding),
            ..Default::default()
        }
    }

    /// Create a hybrid request.
    pub fn hybrid<S: Into<String>>(query: S, embedding: Vec<f32>) -> Self {
        Self {
            lexical_query: Some(query.into()),
            embedding: Some(embedding),
            ..Default::default()
        }
    }

    /// Set the page window.
    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }

    /// Set the term operator.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = Some(mode);
        self
    }

    /// Override the default weighting.
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = Some(weighting);
        self
    }

    /// Restrict results to one file type.
    pub fn with_file_type<S: Into<String>>(mut self, file_type: S) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// The lexical query, ignoring blank strings.
    pub fn effective_query(&self) -> Option<&str> {
        self.lexical_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// The embedding. An empty one is still present and fails the
    /// dimension check.
    pub fn effective_embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Classify the request, or `None` if it names no backend input.
    pub fn query_type(&self) -> Option<QueryType> {
        match (self.effective_query(), self.effective_embedding()) {
            (Some(_), Some(_)) => Some(QueryType::Hybrid),
            (Some(_), None) => Some(QueryType::Lexical),
            (None, Some(_)) => Some(QueryType::Vector),
            (None, None) => None,
        }
    }
}

/// A validated request, ready to be dispatched.
#[derive(Debug, Clone)]
pub struct SearchPlan<'a> {
    pub query_type: QueryType,
    pub lexical_query: Option<&'a str>,
    pub search_mode: SearchMode,
    pub embedding: Option<&'a [f32]>,
    pub page: usize,
    pub page_size: usize,
    pub weighting: Weighting,
    pub filter: SearchFilter,
    /// Hits to request from the lexical backend. Independent of the page,
    /// so every page of a query is cut from the same ranking.
    pub lexical_fetch_size: usize,
    /// `k` to request from the vector backend.
    pub vector_fetch_size: usize,
}

impl<'a> SearchPlan<'a> {
    /// Validate `request` against `config`.
    ///
    /// Checks run before any backend is contacted. An embedding whose length
    /// differs from `config.vector_dimension` yields `DimensionMismatch`; every
    /// other defect yields `InvalidRequest`.
    pub fn from_request(request: &'a SearchRequest, config: &SearchConfig) -> Result<Self> {
        let query_type = request.query_type().ok_or_else(|| {
            UnisearchError::invalid_request("either q or embedding must be provided")
        })?;

        let page = usize::try_from(request.page)
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| {
                UnisearchError::invalid_request(format!(
                    "page must be between 1 and {}, got {}",
                    usize::MAX,
                    request.page
                ))
            })?;
        let page_size = match request.page_size {
            Some(size) => usize::try_from(size)
                .ok()
                .filter(|size| *size >= 1)
                .ok_or_else(|| {
                    UnisearchError::invalid_request(format!("pageSize must be >= 1, got {size}"))
                })?,
            None => config.default_page_size,
        };
        if page_size > config.max_page_size {
            return Err(UnisearchError::invalid_request(format!(
                "pageSize must be <= {}, got {page_size}",
                config.max_page_size
            )));
        }

        let weighting = request.weighting.unwrap_or_else(|| Weighting::from(config));
        weighting.validate()?;

        let embedding = request.effective_embedding();
        if let Some(embedding) = embedding {
            if embedding.len() != config.vector_dimension {
                return Err(UnisearchError::dimension_mismatch(
                    config.vector_dimension,
                    embedding.len(),
                ));
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(UnisearchError::invalid_request(
                    "embedding must contain only finite numbers",
                ));
            }
        }

        let filter = request
            .file_type
            .as_deref()
            .map(SearchFilter::file_type)
            .unwrap_or_default();

        Ok(Self {
            query_type,
            lexical_query: request.effective_query(),
            search_mode: request.search_mode.unwrap_or(config.default_search_mode),
            embedding,
            page,
            page_size,
            weighting,
            filter,
            lexical_fetch_size: config.lexical_fetch_size.min(config.max_fetch_size),
            vector_fetch_size: config.vector_fetch_size.min(config.max_fetch_size),
        })
    }
}
