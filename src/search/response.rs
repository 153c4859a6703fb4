//! Response envelope returned to callers.

use serde::{Deserialize, Serialize};

use crate::backend::types::BackendKind;
use crate::error::{ErrorKind, UnisearchError};
use crate::search::merger::MergedResult;
use crate::search::request::QueryType;

/// Raw hit counts returned by each backend, before deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHitCounts {
    pub lexical: usize,
    pub vector: usize,
}

impl BackendHitCounts {
    pub fn get(&self, backend: BackendKind) -> usize {
        match backend {
            BackendKind::Lexical => self.lexical,
            BackendKind::Vector => self.vector,
        }
    }

    pub fn set(&mut self, backend: BackendKind, count: usize) {
        match backend {
            BackendKind::Lexical => self.lexical = count,
            BackendKind::Vector => self.vector = count,
        }
    }
}

/// Payload of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub results: Vec<MergedResult>,
    /// Deduplicated result count across all pages.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub query_type: QueryType,
    pub backend_hit_counts: BackendHitCounts,
    /// A hybrid request was served by one backend only.
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_backend: Option<BackendKind>,
}

/// Structured error returned instead of a raw failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&UnisearchError> for ErrorBody {
    fn from(error: &UnisearchError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// `{ success, data, error }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SearchData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl SearchResponse {
    pub fn success(data: SearchData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &UnisearchError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody::from(error)),
        }
    }
}

impl From<crate::error::Result<SearchData>> for SearchResponse {
    fn from(result: crate::error::Result<SearchData>) -> Self {
        match result {
            Ok(data) => SearchResponse::success(data),
            Err(error) => SearchResponse::failure(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_shape() {
        let data = SearchData {
            results: Vec::new(),
            total: 0,
            page: 1,
            page_size: 10,
            query_type: QueryType::Hybrid,
            backend_hit_counts: BackendHitCounts {
                lexical: 0,
                vector: 5,
            },
            partial: true,
            failed_backend: Some(BackendKind::Lexical),
        };
        let json = serde_json::to_value(SearchResponse::success(data)).unwrap();
        assert_eq!(
            json,
            json!({
                "success": true,
                "data": {
                    "results": [],
                    "total": 0,
                    "page": 1,
                    "pageSize": 10,
                    "queryType": "hybrid",
                    "backendHitCounts": {"lexical": 0, "vector": 5},
                    "partial": true,
                    "failedBackend": "lexical"
                }
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        let error = UnisearchError::dimension_mismatch(1024, 3);
        let json = serde_json::to_value(SearchResponse::failure(&error)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "DimensionMismatch");
        assert_eq!(json["error"]["message"], "Dimension mismatch: expected 1024, got 3");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_hit_counts_accessors() {
        let mut counts = BackendHitCounts::default();
        counts.set(BackendKind::Vector, 4);
        assert_eq!(counts.get(BackendKind::Vector), 4);
        assert_eq!(counts.get(BackendKind::Lexical), 0);
    }
}
