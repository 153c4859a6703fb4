//! Business-key derivation.
//!
//! Backends assign their own ids, so the same file can come back as
//! `abc123` from the text index and `thumb-77` from the image index. The
//! business key is what both hits agree on: the file path, taken from the
//! first configured field that carries one and put into a canonical form.

use regex::Regex;

use crate::backend::types::SearchHit;
use crate::config::BusinessKeyConfig;
use crate::error::{Result, UnisearchError};

/// Derives the cross-backend identity of a hit.
#[derive(Debug, Clone)]
pub struct BusinessKeyRule {
    fields: Vec<String>,
    case_insensitive: bool,
    separators: Regex,
}

impl BusinessKeyRule {
    pub fn new(config: &BusinessKeyConfig) -> Result<Self> {
        let fields: Vec<String> = config
            .fields
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            return Err(UnisearchError::invalid_config(
                "business key needs at least one field",
            ));
        }

        let separators = Regex::new(r"[/\\]+")
            .map_err(|e| UnisearchError::other(format!("separator pattern: {e}")))?;

        Ok(Self {
            fields,
            case_insensitive: config.case_insensitive,
            separators,
        })
    }

    /// Key for `hit`.
    ///
    /// Falls back to `<backend>:<id>` when none of the configured fields is
    /// present, so hits without a path never merge across backends.
    pub fn derive(&self, hit: &SearchHit) -> String {
        self.fields
            .iter()
            .filter_map(|name| hit.field_str(name))
            .map(|value| self.canonicalize(value))
            .find(|key| !key.is_empty())
            .unwrap_or_else(|| format!("{}:{}", hit.source_backend, hit.id))
    }

    /// Trim, unify separators to `/`, collapse runs and drop a trailing `/`.
    pub fn canonicalize(&self, path: &str) -> String {
        let unified = self.separators.replace_all(path.trim(), "/");
        let mut key = if unified.len() > 1 {
            unified.trim_end_matches('/').to_string()
        } else {
            unified.into_owned()
        };
        if self.case_insensitive {
            key = key.to_lowercase();
        }
        key
    }
}
