//! Score normalization.
//!
//! Lexical relevance and vector similarity live on unrelated scales, so each
//! backend's hits are rescaled into `[0, 1]` using the min and max of that
//! backend's own hits for the current query. Scores from different backends
//! are never mixed here.

use log::warn;

use crate::backend::types::SearchHit;

/// A hit together with its score rescaled into `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHit {
    pub hit: SearchHit,
    pub normalized_score: f32,
}

/// Min-max normalizer over one backend's hit set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreNormalizer;

impl ScoreNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize all hits returned by one backend for one query.
    ///
    /// Scales with `(score - min) / (max - min)`. When every score is equal
    /// (including a single hit) the range is zero and every hit gets `1.0`.
    /// Hits with a non-finite raw score are dropped.
    pub fn normalize(&self, hits: Vec<SearchHit>) -> Vec<NormalizedHit> {
        let before = hits.len();
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| hit.raw_score.is_finite())
            .collect();
        if hits.len() != before {
            warn!(
                "dropped {} hit(s) with non-finite scores",
                before - hits.len()
            );
        }
        if hits.is_empty() {
            return Vec::new();
        }

        let min = hits.iter().fold(f32::INFINITY, |a, h| a.min(h.raw_score));
        let max = hits
            .iter()
            .fold(f32::NEG_INFINITY, |a, h| a.max(h.raw_score));
        let range = max - min;

        hits.into_iter()
            .map(|hit| {
                let normalized_score = if range > 0.0 {
                    ((hit.raw_score - min) / range).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                NormalizedHit {
                    hit,
                    normalized_score,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::BackendKind;

    fn hits(scores: &[f32]) -> Vec<SearchHit> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| SearchHit::new(format!("d{i}"), BackendKind::Lexical, *s))
            .collect()
    }

    fn normalized(scores: &[f32]) -> Vec<f32> {
        ScoreNormalizer::new()
            .normalize(hits(scores))
            .into_iter()
            .map(|h| h.normalized_score)
            .collect()
    }

    #[test]
    fn test_min_max() {
        assert_eq!(normalized(&[12.5, 8.0, 8.0]), vec![1.0, 0.0, 0.0]);
        assert_eq!(normalized(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_range_bounds() {
        let scores = [0.31, 17.2, -4.0, 9.9, 3.3, 0.0];
        let result = normalized(&scores);
        assert!(result.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(result[1], 1.0);
        assert_eq!(result[2], 0.0);
    }

    #[test]
    fn test_degenerate_sets() {
        assert!(normalized(&[]).is_empty());
        assert_eq!(normalized(&[0.42]), vec![1.0]);
        assert_eq!(normalized(&[3.0, 3.0, 3.0]), vec![1.0, 1.0, 1.0]);
        assert_eq!(normalized(&[0.0, 0.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_non_finite_scores_dropped() {
        let result = ScoreNormalizer::new().normalize(hits(&[1.0, f32::NAN, 3.0, f32::INFINITY]));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].hit.id, "d0");
        assert_eq!(result[0].normalized_score, 0.0);
        assert_eq!(result[1].hit.id, "d2");
        assert_eq!(result[1].normalized_score, 1.0);
    }
}
