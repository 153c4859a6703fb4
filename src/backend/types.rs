//! Types shared by all backend clients.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, UnisearchError};

/// Which backend produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Full-text index over file name, path and content.
    Lexical,
    /// Nearest-neighbor index over image embeddings.
    Vector,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Lexical => "lexical",
            BackendKind::Vector => "vector",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean operator applied between the terms of a lexical query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMode {
    /// Every term must match.
    And,
    /// Any term may match.
    #[default]
    Or,
}

impl SearchMode {
    /// Operator name as understood by the full-text engine.
    pub fn operator(&self) -> &'static str {
        match self {
            SearchMode::And => "and",
            SearchMode::Or => "or",
        }
    }
}

impl FromStr for SearchMode {
    type Err = UnisearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(SearchMode::And),
            "OR" => Ok(SearchMode::Or),
            other => Err(UnisearchError::invalid_request(format!(
                "unknown search mode '{other}', expected AND or OR"
            ))),
        }
    }
}

/// Attribute holding the lower-case file extension of a document.
pub const FILE_TYPE_FIELD: &str = "file_type";

/// Restrictions a backend applies before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Lower-case file extension without the leading dot.
    pub file_type: Option<String>,
}

impl SearchFilter {
    /// No restriction.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only documents of the given file type. `".PDF"` and `"pdf"` are the
    /// same filter; a blank value means no restriction.
    pub fn file_type<S: AsRef<str>>(file_type: S) -> Self {
        let normalized = file_type
            .as_ref()
            .trim()
            .trim_start_matches('.')
            .to_lowercase();
        Self {
            file_type: (!normalized.is_empty()).then_some(normalized),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_type.is_none()
    }

    /// Whether a document with these attributes passes the filter.
    pub fn matches(&self, fields: &BTreeMap<String, Value>, file_type_field: &str) -> bool {
        let Some(wanted) = &self.file_type else {
            return true;
        };
        fields
            .get(file_type_field)
            .and_then(Value::as_str)
            .is_some_and(|actual| actual.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }
}

/// A single hit as returned by one backend for one query execution.
///
/// `raw_score` is on the backend's own scale and is only comparable with
/// other hits from the same call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Backend-native document id.
    pub id: String,

    /// Backend that produced the hit.
    pub source_backend: BackendKind,

    /// Backend-native relevance or similarity score.
    pub raw_score: f32,

    /// Display attributes (name, path, type, size, ...).
    pub fields: BTreeMap<String, Value>,
}

impl SearchHit {
    /// Create a new hit without fields.
    pub fn new<S: Into<String>>(id: S, source_backend: BackendKind, raw_score: f32) -> Self {
        Self {
            id: id.into(),
            source_backend,
            raw_score,
            fields: BTreeMap::new(),
        }
    }

    /// Add a display attribute.
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace all display attributes.
    pub fn with_fields(mut self, fields: BTreeMap<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    /// Get a string attribute, if present.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}
