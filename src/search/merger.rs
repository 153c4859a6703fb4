//! Result merger for hybrid search.
//!
//! Folds normalized hits from both backends into one ranked list with a
//! single entry per business key.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::types::BackendKind;
use crate::search::key::BusinessKeyRule;
use crate::search::normalizer::NormalizedHit;
use crate::search::request::Weighting;

/// One ranked, deduplicated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedResult {
    /// Business key.
    pub id: String,

    /// Display attributes. Lexical fields win; the vector hit fills gaps.
    pub fields: BTreeMap<String, Value>,

    /// Weighted sum of the normalized scores of the contributing backends.
    pub combined_score: f32,

    /// Backends that returned this key.
    pub contributing_backends: BTreeSet<BackendKind>,

    /// Normalized lexical score, if the lexical backend returned this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_score: Option<f32>,

    /// Normalized vector score, if the vector backend returned this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f32>,
}

impl MergedResult {
    /// Whether both backends returned this key.
    pub fn is_hybrid_match(&self) -> bool {
        self.contributing_backends.len() > 1
    }
}

/// At most one hit per backend for a single business key.
#[derive(Debug, Default)]
struct KeyGroup {
    lexical: Option<NormalizedHit>,
    vector: Option<NormalizedHit>,
}

impl KeyGroup {
    fn slot(&mut self, backend: BackendKind) -> &mut Option<NormalizedHit> {
        match backend {
            BackendKind::Lexical => &mut self.lexical,
            BackendKind::Vector => &mut self.vector,
        }
    }

    /// Keep the better of the current and the new hit: higher normalized
    /// score, then smaller native id. Independent of arrival order.
    fn offer(&mut self, candidate: NormalizedHit) {
        let slot = self.slot(candidate.hit.source_backend);
        let replace = match slot {
            None => true,
            Some(current) => match candidate
                .normalized_score
                .total_cmp(&current.normalized_score)
            {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => candidate.hit.id < current.hit.id,
            },
        };
        if replace {
            *slot = Some(candidate);
        }
    }
}

/// Merger for combining lexical and vector search results.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    key_rule: BusinessKeyRule,
}

impl ResultMerger {
    /// Create a new result merger.
    pub fn new(key_rule: BusinessKeyRule) -> Self {
        Self { key_rule }
    }

    pub fn key_rule(&self) -> &BusinessKeyRule {
        &self.key_rule
    }

    /// Merge normalized hits from both backends.
    ///
    /// A key seen by only one backend scores that backend's weighted term
    /// alone; it is neither penalized nor rescaled for the missing signal.
    /// Output is sorted by combined score descending, then key ascending, so
    /// the order does not depend on the order hits arrived in.
    pub fn merge(
        &self,
        lexical: Vec<NormalizedHit>,
        vector: Vec<NormalizedHit>,
        weighting: &Weighting,
    ) -> Vec<MergedResult> {
        let mut groups: AHashMap<String, KeyGroup> =
            AHashMap::with_capacity(lexical.len() + vector.len());

        for hit in lexical.into_iter().chain(vector) {
            let key = self.key_rule.derive(&hit.hit);
            groups.entry(key).or_default().offer(hit);
        }

        let mut merged: Vec<MergedResult> = groups
            .into_iter()
            .map(|(key, group)| Self::combine(key, group, weighting))
            .collect();

        merged.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.id.cmp(&b.id))
        });

        merged
    }

    fn combine(key: String, group: KeyGroup, weighting: &Weighting) -> MergedResult {
        let mut combined_score = 0.0;
        let mut contributing_backends = BTreeSet::new();
        let mut fields = BTreeMap::new();
        let mut lexical_score = None;
        let mut vector_score = None;

        for normalized in [group.lexical, group.vector].into_iter().flatten() {
            let backend = normalized.hit.source_backend;
            combined_score += weighting.weight(backend) * normalized.normalized_score;
            contributing_backends.insert(backend);
            match backend {
                BackendKind::Lexical => lexical_score = Some(normalized.normalized_score),
                BackendKind::Vector => vector_score = Some(normalized.normalized_score),
            }
            for (name, value) in normalized.hit.fields {
                fields.entry(name).or_insert(value);
            }
        }

        MergedResult {
            id: key,
            fields,
            combined_score,
            contributing_backends,
            lexical_score,
            vector_score,
        }
    }
}
