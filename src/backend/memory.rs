//! In-memory backends.
//!
//! These keep a small corpus in process and implement the client traits
//! without any network I/O. They back the CLI when no cluster is configured
//! and are handy in tests and benchmarks.
//!
//! Corpora are JSON Lines files, one [`MemoryDocument`] per line:
//!
//! ```text
//! {"id":"d1","fields":{"file_name":"契約書.pdf","file_path":"/docs/契約書.pdf","file_type":"pdf","content":"..."}}
//! {"id":"t1","fields":{"source_file_path":"/docs/契約書.pdf"},"embedding":[0.1,0.2,0.3]}
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::lexical::LexicalClient;
use crate::backend::types::{BackendKind, FILE_TYPE_FIELD, SearchFilter, SearchHit, SearchMode};
use crate::backend::vector::VectorClient;
use crate::error::{Result, UnisearchError};

/// A document stored by the in-memory backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Native id inside this backend.
    pub id: String,

    /// Display attributes, also the searchable text for the lexical backend.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    /// Image embedding, used by the vector backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryDocument {
    /// Create a document without fields.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
            embedding: None,
        }
    }

    /// Add a display attribute.
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Read a JSON Lines corpus.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<MemoryDocument>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut documents = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: MemoryDocument = serde_json::from_str(&line).map_err(|e| {
            UnisearchError::invalid_config(format!(
                "{}:{}: {e}",
                path.as_ref().display(),
                line_no + 1
            ))
        })?;
        documents.push(doc);
    }

    Ok(documents)
}

/// Fields searched by [`MemoryLexicalBackend`] and their boosts.
pub const DEFAULT_LEXICAL_FIELDS: &[(&str, f32)] =
    &[("file_name", 3.0), ("file_path", 2.0), ("content", 1.0)];

/// Term-occurrence full-text backend.
///
/// The score of a document is the sum, over query terms and searched fields,
/// of `boost × occurrences`. Matching is case-insensitive substring matching,
/// which also works for unsegmented CJK text.
#[derive(Debug, Clone)]
pub struct MemoryLexicalBackend {
    documents: Vec<MemoryDocument>,
    fields: Vec<(String, f32)>,
}

impl Default for MemoryLexicalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLexicalBackend {
    /// Create an empty backend searching the default fields.
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            fields: DEFAULT_LEXICAL_FIELDS
                .iter()
                .map(|(name, boost)| (name.to_string(), *boost))
                .collect(),
        }
    }

    /// Load a backend from a JSON Lines corpus.
    pub fn from_jsonl<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut backend = Self::new();
        for doc in load_corpus(path)? {
            backend.add_document(doc);
        }
        Ok(backend)
    }

    /// Replace the searched fields and their boosts.
    pub fn with_fields(mut self, fields: Vec<(String, f32)>) -> Self {
        self.fields = fields;
        self
    }

    /// Add a document to the backend.
    pub fn add_document(&mut self, doc: MemoryDocument) {
        self.documents.push(doc);
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn score_document(&self, doc: &MemoryDocument, terms: &[String], mode: SearchMode) -> f32 {
        let texts: Vec<(String, f32)> = self
            .fields
            .iter()
            .filter_map(|(name, boost)| {
                doc.fields
                    .get(name)
                    .and_then(Value::as_str)
                    .map(|text| (text.to_lowercase(), *boost))
            })
            .collect();

        let mut score = 0.0;
        let mut matched_terms = 0;
        for term in terms {
            let term_score: f32 = texts
                .iter()
                .map(|(text, boost)| text.matches(term.as_str()).count() as f32 * boost)
                .sum();
            if term_score > 0.0 {
                matched_terms += 1;
                score += term_score;
            }
        }

        let accepted = match mode {
            SearchMode::And => matched_terms == terms.len(),
            SearchMode::Or => matched_terms > 0,
        };
        if accepted { score } else { 0.0 }
    }
}

#[async_trait]
impl LexicalClient for MemoryLexicalBackend {
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        filter: &SearchFilter,
        size: usize,
    ) -> Result<Vec<SearchHit>> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter(|doc| filter.matches(&doc.fields, FILE_TYPE_FIELD))
            .filter_map(|doc| {
                let score = self.score_document(doc, &terms, mode);
                (score > 0.0).then(|| {
                    SearchHit::new(doc.id.clone(), BackendKind::Lexical, score)
                        .with_fields(doc.fields.clone())
                })
            })
            .collect();

        // Sort by score descending, then by id for consistent results
        hits.sort_by(|a, b| {
            b.raw_score
                .total_cmp(&a.raw_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(size);
        Ok(hits)
    }

    fn name(&self) -> &str {
        "memory-lexical"
    }
}

/// Brute-force cosine-similarity backend.
///
/// Scores are `(1 + cos) / 2`, so they lie in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct MemoryVectorBackend {
    dimension: usize,
    documents: Vec<(MemoryDocument, Vec<f32>)>,
}

impl MemoryVectorBackend {
    /// Create an empty backend for embeddings of the given width.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: Vec::new(),
        }
    }

    /// Load a backend from a JSON Lines corpus. Lines without an embedding are
    /// skipped.
    pub fn from_jsonl<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self> {
        let mut backend = Self::new(dimension);
        for doc in load_corpus(path)? {
            if doc.embedding.is_some() {
                backend.add_document(doc)?;
            }
        }
        Ok(backend)
    }

    /// Add a document. Fails if it has no embedding or the wrong width.
    pub fn add_document(&mut self, mut doc: MemoryDocument) -> Result<()> {
        let embedding = doc.embedding.take().ok_or_else(|| {
            UnisearchError::invalid_config(format!("document '{}' has no embedding", doc.id))
        })?;
        if embedding.len() != self.dimension {
            return Err(UnisearchError::dimension_mismatch(
                self.dimension,
                embedding.len(),
            ));
        }
        self.documents.push((doc, embedding));
        Ok(())
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorClient for MemoryVectorBackend {
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

        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter(|(doc, _)| filter.matches(&doc.fields, FILE_TYPE_FIELD))
            .map(|(doc, vector)| {
                let score = (1.0 + cosine_similarity(embedding, vector)) / 2.0;
                SearchHit::new(doc.id.clone(), BackendKind::Vector, score)
                    .with_fields(doc.fields.clone())
            })
            .collect();

        hits.sort_by(|a, b| {
            b.raw_score
                .total_cmp(&a.raw_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "memory-vector"
    }
}
