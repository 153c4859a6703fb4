//! OpenSearch adapters.
//!
//! Both clients talk to the `_search` endpoint of one index over HTTP. The
//! lexical client issues a `multi_match` query over the configured text
//! fields and asks for highlighted fragments, which come back in the hit's
//! `_highlight` field. The vector client issues a `knn` query against the
//! embedding field. A file-type filter becomes a `term` filter in both. The
//! embedding itself is excluded from returned sources.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::backend::lexical::LexicalClient;
use crate::backend::types::{BackendKind, SearchFilter, SearchHit, SearchMode};
use crate::backend::vector::VectorClient;
use crate::config::OpenSearchConfig;
use crate::error::{Result, UnisearchError};

/// `_search` response, reduced to what we read.
#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: BTreeMap<String, Value>,
    #[serde(default)]
    highlight: Option<Value>,
}

/// Field under which highlighted fragments are attached to a hit.
pub const HIGHLIGHT_FIELD: &str = "_highlight";

/// HTTP plumbing shared by both clients.
#[derive(Debug, Clone)]
struct Transport {
    client: Client,
    search_url: String,
    timeout: Duration,
}

impl Transport {
    fn new(config: &OpenSearchConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UnisearchError::invalid_config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url: format!(
                "{}/{}/_search",
                config.endpoint.trim_end_matches('/'),
                config.index
            ),
            timeout,
        })
    }

    async fn search(&self, backend: BackendKind, body: &Value) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(&self.search_url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(backend, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(UnisearchError::unavailable(
                backend,
                format!("HTTP {status}: {snippet}"),
            ));
        }

        let body: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| self.transport_error(backend, e))?;
        Ok(into_hits(backend, body))
    }

    fn transport_error(&self, backend: BackendKind, error: reqwest::Error) -> UnisearchError {
        if error.is_timeout() {
            UnisearchError::timeout(backend, self.timeout.as_millis() as u64)
        } else {
            UnisearchError::unavailable(backend, error.to_string())
        }
    }
}

/// Hits without a score cannot be placed on the min-max scale and are
/// dropped.
fn into_hits(backend: BackendKind, body: SearchResponseBody) -> Vec<SearchHit> {
    body.hits
        .hits
        .into_iter()
        .filter_map(|raw| {
            let Some(score) = raw.score else {
                warn!("{backend} hit '{}' has no score, dropping it", raw.id);
                return None;
            };
            let mut hit = SearchHit::new(raw.id, backend, score).with_fields(raw.source);
            if let Some(highlight) = raw.highlight {
                hit.fields.insert(HIGHLIGHT_FIELD.to_string(), highlight);
            }
            Some(hit)
        })
        .collect()
}

fn term_filter(config: &OpenSearchConfig, filter: &SearchFilter) -> Option<Value> {
    filter.file_type.as_ref().map(|file_type| {
        let mut term = serde_json::Map::new();
        term.insert(config.file_type_field.clone(), json!(file_type));
        json!({ "term": term })
    })
}

/// Build the `multi_match` request body.
pub fn lexical_query_body(
    config: &OpenSearchConfig,
    query: &str,
    mode: SearchMode,
    filter: &SearchFilter,
    size: usize,
) -> Value {
    let mut multi_match = json!({
        "query": query,
        "fields": config.lexical_fields,
        "type": "best_fields",
        "operator": mode.operator()
    });
    if let Some(fuzziness) = &config.fuzziness {
        multi_match["fuzziness"] = json!(fuzziness);
    }

    let mut query = json!({ "multi_match": multi_match });
    if let Some(term) = term_filter(config, filter) {
        query = json!({ "bool": { "must": [query], "filter": [term] } });
    }

    let mut body = json!({
        "size": size,
        "_source": { "excludes": [config.vector_field] },
        "query": query
    });
    if config.highlight {
        // Boost suffixes are not valid in highlight field names.
        let fields: serde_json::Map<String, Value> = config
            .lexical_fields
            .iter()
            .map(|field| field.split('^').next().unwrap_or(field.as_str()))
            .map(|name| (name.to_string(), json!({})))
            .collect();
        body["highlight"] = json!({ "fields": fields });
    }
    body
}

/// Build the `knn` request body.
pub fn vector_query_body(
    config: &OpenSearchConfig,
    embedding: &[f32],
    filter: &SearchFilter,
    k: usize,
) -> Value {
    let mut params = json!({ "vector": embedding, "k": k });
    if let Some(term) = term_filter(config, filter) {
        params["filter"] = term;
    }

    let mut knn = serde_json::Map::new();
    knn.insert(config.vector_field.clone(), params);
    json!({
        "size": k,
        "_source": { "excludes": [config.vector_field] },
        "query": { "knn": knn }
    })
}

/// Full-text client for an OpenSearch index.
#[derive(Debug, Clone)]
pub struct OpenSearchLexicalClient {
    transport: Transport,
    config: OpenSearchConfig,
}

impl OpenSearchLexicalClient {
    pub fn new(config: &OpenSearchConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config, timeout)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl LexicalClient for OpenSearchLexicalClient {
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        filter: &SearchFilter,
        size: usize,
    ) -> Result<Vec<SearchHit>> {
        let body = lexical_query_body(&self.config, query, mode, filter, size);
        self.transport.search(BackendKind::Lexical, &body).await
    }

    fn name(&self) -> &str {
        "opensearch-lexical"
    }
}

/// k-NN client for an OpenSearch index.
#[derive(Debug, Clone)]
pub struct OpenSearchVectorClient {
    transport: Transport,
    config: OpenSearchConfig,
    dimension: usize,
}

impl OpenSearchVectorClient {
    pub fn new(config: &OpenSearchConfig, dimension: usize, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config, timeout)?,
            config: config.clone(),
            dimension,
        })
    }
}

#[async_trait]
impl VectorClient for OpenSearchVectorClient {
    async fn search(
        &self,
        embedding: &[f32],
        filter: &SearchFilter,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if embedding.len() != self.dimension {
            return Err(UnisearchError::dimension_mismatch(
                self.dimension,
                embedding.len(),
            ));
        }
        let body = vector_query_body(&self.config, embedding, filter, k);
        self.transport.search(BackendKind::Vector, &body).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "opensearch-vector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_body() {
        let config = OpenSearchConfig::default();
        let body =
            lexical_query_body(&config, "契約書", SearchMode::And, &SearchFilter::none(), 50);
        assert_eq!(body["size"], 50);
        let multi_match = &body["query"]["multi_match"];
        assert_eq!(multi_match["query"], "契約書");
        assert_eq!(multi_match["operator"], "and");
        assert_eq!(multi_match["type"], "best_fields");
        assert_eq!(multi_match["fields"], json!(["file_name^3", "file_path^2", "content"]));
        assert_eq!(body["_source"]["excludes"][0], "image_embedding");
    }

    #[test]
    fn test_lexical_body_fuzziness() {
        let mut config = OpenSearchConfig::default();
        let body = lexical_query_body(&config, "q", SearchMode::Or, &SearchFilter::none(), 10);
        assert_eq!(body["query"]["multi_match"]["fuzziness"], "AUTO");

        config.fuzziness = None;
        let body = lexical_query_body(&config, "q", SearchMode::Or, &SearchFilter::none(), 10);
        assert!(body["query"]["multi_match"].get("fuzziness").is_none());
    }

    #[test]
    fn test_lexical_body_highlight() {
        let mut config = OpenSearchConfig::default();
        let body = lexical_query_body(&config, "q", SearchMode::Or, &SearchFilter::none(), 10);
        assert_eq!(
            body["highlight"]["fields"],
            json!({ "file_name": {}, "file_path": {}, "content": {} })
        );

        config.highlight = false;
        let body = lexical_query_body(&config, "q", SearchMode::Or, &SearchFilter::none(), 10);
        assert!(body.get("highlight").is_none());
    }

    #[test]
    fn test_lexical_body_file_type_filter() {
        let config = OpenSearchConfig::default();
        let filter = SearchFilter::file_type("PDF");
        let body = lexical_query_body(&config, "契約書", SearchMode::Or, &filter, 10);

        let bool_query = &body["query"]["bool"];
        assert_eq!(bool_query["must"][0]["multi_match"]["query"], "契約書");
        assert_eq!(bool_query["filter"][0], json!({ "term": { "file_type": "pdf" } }));
    }

    #[test]
    fn test_vector_body() {
        let config = OpenSearchConfig::default();
        let body = vector_query_body(&config, &[0.5, 0.25], &SearchFilter::none(), 7);
        assert_eq!(body["size"], 7);
        let knn = &body["query"]["knn"]["image_embedding"];
        assert_eq!(knn["k"], 7);
        assert_eq!(knn["vector"], json!([0.5, 0.25]));
        assert!(knn.get("filter").is_none());
    }

    #[test]
    fn test_vector_body_file_type_filter() {
        let config = OpenSearchConfig {
            file_type_field: "fileType".to_string(),
            ..Default::default()
        };
        let body = vector_query_body(&config, &[0.5], &SearchFilter::file_type("png"), 3);
        assert_eq!(
            body["query"]["knn"]["image_embedding"]["filter"],
            json!({ "term": { "fileType": "png" } })
        );
    }

    #[test]
    fn test_parse_response() {
        let body: SearchResponseBody = serde_json::from_value(json!({
            "took": 3,
            "hits": {
                "total": {"value": 2},
                "hits": [
                    {"_id": "a", "_score": 4.5, "_source": {"file_path": "/a.pdf"},
                     "highlight": {"content": ["<em>契約書</em>の写し"]}},
                    {"_id": "b", "_score": null},
                    {"_id": "c", "_score": 1.0}
                ]
            }
        }))
        .unwrap();

        let hits = into_hits(BackendKind::Lexical, body);
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(hits[0].raw_score, 4.5);
        assert_eq!(hits[0].field_str("file_path"), Some("/a.pdf"));
        assert_eq!(
            hits[0].fields[HIGHLIGHT_FIELD],
            json!({"content": ["<em>契約書</em>の写し"]})
        );
        assert!(hits[1].fields.is_empty());
    }

    #[test]
    fn test_search_url() {
        let config = OpenSearchConfig {
            endpoint: "https://search.example.com/".to_string(),
            index: "files".to_string(),
            ..Default::default()
        };
        let client = OpenSearchLexicalClient::new(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.transport.search_url,
            "https://search.example.com/files/_search"
        );
    }

    #[test]
    fn test_vector_client_rejects_wrong_dimension() {
        let client =
            OpenSearchVectorClient::new(&OpenSearchConfig::default(), 4, Duration::from_secs(1))
                .unwrap();
        let result =
            tokio_test::block_on(client.search(&[1.0, 2.0], &SearchFilter::none(), 3));
        assert!(matches!(
            result,
            Err(UnisearchError::DimensionMismatch { expected: 4, actual: 2 })
        ));
    }
}
