//! Configuration for the search dispatcher.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::types::{FILE_TYPE_FIELD, SearchMode};
use crate::error::{Result, UnisearchError};

/// Configuration for [`QueryDispatcher`](crate::search::dispatcher::QueryDispatcher).
///
/// Every field has a default, so a config file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default lexical weight in the combined score.
    pub lexical_weight: f32,

    /// Default vector weight in the combined score.
    pub vector_weight: f32,

    /// Timeout for a single lexical backend call, in milliseconds.
    pub lexical_timeout_ms: u64,

    /// Timeout for a single vector backend call, in milliseconds.
    pub vector_timeout_ms: u64,

    /// Embedding width expected by the vector index.
    pub vector_dimension: usize,

    /// Hits requested from the lexical backend. Every page of a query is cut
    /// from this one window, so it bounds the reachable results.
    pub lexical_fetch_size: usize,

    /// `k` requested from the vector backend.
    pub vector_fetch_size: usize,

    /// Upper bound on hits requested from either backend.
    pub max_fetch_size: usize,

    /// Page size used when a request does not specify one.
    pub default_page_size: usize,

    /// Largest page size a request may ask for.
    pub max_page_size: usize,

    /// Term operator used when a request does not specify one.
    pub default_search_mode: SearchMode,

    /// How hits from different backends are recognized as the same file.
    pub business_key: BusinessKeyConfig,

    /// OpenSearch cluster, when the HTTP adapters are used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opensearch: Option<OpenSearchConfig>,
}

/// Business-key derivation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessKeyConfig {
    /// Candidate fields, in priority order. The first non-empty string wins.
    pub fields: Vec<String>,

    /// Lower-case the key before comparing.
    pub case_insensitive: bool,
}

impl Default for BusinessKeyConfig {
    fn default() -> Self {
        Self {
            fields: vec!["source_file_path".to_string(), "file_path".to_string()],
            case_insensitive: false,
        }
    }
}

/// Connection settings for the OpenSearch adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSearchConfig {
    /// Base URL, e.g. `https://search.example.com`.
    pub endpoint: String,

    /// Index holding both text and embedding documents.
    pub index: String,

    /// `multi_match` fields with optional `^boost` suffix.
    pub lexical_fields: Vec<String>,

    /// `knn_vector` field name.
    pub vector_field: String,

    /// `multi_match` fuzziness, e.g. `"AUTO"`. `null` disables fuzzy matching.
    pub fuzziness: Option<String>,

    /// Ask for highlighted fragments of the lexical fields.
    pub highlight: bool,

    /// Keyword field the `fileType` filter is applied to.
    pub file_type_field: String,
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            index: "file-index".to_string(),
            lexical_fields: vec![
                "file_name^3".to_string(),
                "file_path^2".to_string(),
                "content".to_string(),
            ],
            vector_field: "image_embedding".to_string(),
            fuzziness: Some("AUTO".to_string()),
            highlight: true,
            file_type_field: FILE_TYPE_FIELD.to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.6,
            vector_weight: 0.4,
            lexical_timeout_ms: 3000,
            vector_timeout_ms: 3000,
            vector_dimension: 1024,
            lexical_fetch_size: 100,
            vector_fetch_size: 100,
            max_fetch_size: 1000,
            default_page_size: 20,
            max_page_size: 100,
            default_search_mode: SearchMode::Or,
            business_key: BusinessKeyConfig::default(),
            opensearch: None,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the default weights.
    pub fn with_weights(mut self, lexical_weight: f32, vector_weight: f32) -> Self {
        self.lexical_weight = lexical_weight;
        self.vector_weight = vector_weight;
        self
    }

    /// Set both backend timeouts.
    pub fn with_timeouts(mut self, lexical: Duration, vector: Duration) -> Self {
        self.lexical_timeout_ms = lexical.as_millis() as u64;
        self.vector_timeout_ms = vector.as_millis() as u64;
        self
    }

    /// Set the number of hits requested from each backend.
    pub fn with_fetch_sizes(mut self, lexical: usize, vector: usize) -> Self {
        self.lexical_fetch_size = lexical;
        self.vector_fetch_size = vector;
        self
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.vector_dimension = dimension;
        self
    }

    /// Set the business-key rule.
    pub fn with_business_key(mut self, business_key: BusinessKeyConfig) -> Self {
        self.business_key = business_key;
        self
    }

    /// Set the OpenSearch connection.
    pub fn with_opensearch(mut self, opensearch: OpenSearchConfig) -> Self {
        self.opensearch = Some(opensearch);
        self
    }

    pub fn lexical_timeout(&self) -> Duration {
        Duration::from_millis(self.lexical_timeout_ms)
    }

    pub fn vector_timeout(&self) -> Duration {
        Duration::from_millis(self.vector_timeout_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexical_weight", self.lexical_weight),
            ("vector_weight", self.vector_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(UnisearchError::invalid_config(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        if self.lexical_timeout_ms == 0 || self.vector_timeout_ms == 0 {
            return Err(UnisearchError::invalid_config(
                "Backend timeouts must be greater than 0",
            ));
        }

        if self.vector_dimension == 0 {
            return Err(UnisearchError::invalid_config(
                "vector_dimension must be greater than 0",
            ));
        }

        if self.lexical_fetch_size == 0 || self.vector_fetch_size == 0 || self.max_fetch_size == 0
        {
            return Err(UnisearchError::invalid_config(
                "Fetch sizes must be greater than 0",
            ));
        }

        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(UnisearchError::invalid_config(format!(
                "default_page_size must be between 1 and {}, got {}",
                self.max_page_size, self.default_page_size
            )));
        }

        if self.business_key.fields.iter().all(|f| f.trim().is_empty()) {
            return Err(UnisearchError::invalid_config(
                "business_key.fields must name at least one field",
            ));
        }

        if let Some(opensearch) = &self.opensearch {
            if opensearch.endpoint.trim().is_empty()
                || opensearch.index.trim().is_empty()
                || opensearch.file_type_field.trim().is_empty()
            {
                return Err(UnisearchError::invalid_config(
                    "opensearch.endpoint, opensearch.index and opensearch.file_type_field are required",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lexical_weight, 0.6);
        assert_eq!(config.vector_weight, 0.4);
        assert_eq!(config.vector_dimension, 1024);
        assert_eq!(config.lexical_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_validation_failures() {
        assert!(SearchConfig::new().with_weights(-0.1, 0.5).validate().is_err());
        assert!(SearchConfig::new().with_weights(f32::NAN, 0.5).validate().is_err());
        assert!(SearchConfig::new().with_dimension(0).validate().is_err());
        assert!(
            SearchConfig::new()
                .with_timeouts(Duration::ZERO, Duration::from_secs(1))
                .validate()
                .is_err()
        );

        let mut config = SearchConfig::new();
        config.default_page_size = 500;
        assert!(config.validate().is_err());

        let config = SearchConfig::new().with_business_key(BusinessKeyConfig {
            fields: vec![],
            case_insensitive: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weights_need_not_sum_to_one() {
        assert!(SearchConfig::new().with_weights(1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_from_file_with_partial_overrides() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"vector_dimension": 512, "default_search_mode": "AND",
                "opensearch": {{"endpoint": "http://os:9200", "index": "docs"}}}}"#
        )?;

        let config = SearchConfig::from_file(file.path())?;
        assert_eq!(config.vector_dimension, 512);
        assert_eq!(config.default_search_mode, SearchMode::And);
        assert_eq!(config.lexical_weight, 0.6);

        let opensearch = config.opensearch.unwrap();
        assert_eq!(opensearch.index, "docs");
        assert_eq!(opensearch.vector_field, "image_embedding");
        assert_eq!(opensearch.fuzziness.as_deref(), Some("AUTO"));
        assert!(opensearch.highlight);
        assert_eq!(opensearch.file_type_field, "file_type");
        Ok(())
    }

    #[test]
    fn test_fuzziness_can_be_disabled() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"opensearch": {{"endpoint": "http://os:9200", "fuzziness": null, "highlight": false}}}}"#
        )?;

        let opensearch = SearchConfig::from_file(file.path())?.opensearch.unwrap();
        assert_eq!(opensearch.fuzziness, None);
        assert!(!opensearch.highlight);
        assert_eq!(opensearch.index, "file-index");
        Ok(())
    }

    #[test]
    fn test_from_file_rejects_invalid() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"max_fetch_size": 0}}"#)?;
        assert!(matches!(
            SearchConfig::from_file(file.path()),
            Err(UnisearchError::InvalidConfig(_))
        ));
        Ok(())
    }
}
