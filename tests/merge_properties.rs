use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use unisearch::backend::{BackendKind, SearchHit};
use unisearch::config::BusinessKeyConfig;
use unisearch::search::{BusinessKeyRule, MergedResult, Paginator, ResultMerger, ScoreNormalizer, Weighting};

fn merger() -> ResultMerger {
    ResultMerger::new(BusinessKeyRule::new(&BusinessKeyConfig::default()).unwrap())
}

/// Random hits over a small key space so that keys collide within and
/// across backends.
fn random_hits(rng: &mut StdRng, backend: BackendKind, count: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| {
            let key = rng.random_range(0..count.max(1) * 2 / 3 + 1);
            let score: f32 = rng.random_range(0.0..20.0);
            let separator = if rng.random_bool(0.5) { "/" } else { "\\" };
            SearchHit::new(format!("{}-{i}", backend.as_str()), backend, score)
                .with_field("file_path", format!("{separator}files{separator}doc-{key}.pdf"))
        })
        .collect()
}

fn run(lexical: Vec<SearchHit>, vector: Vec<SearchHit>) -> Vec<MergedResult> {
    let normalizer = ScoreNormalizer::new();
    merger().merge(
        normalizer.normalize(lexical),
        normalizer.normalize(vector),
        &Weighting::new(0.6, 0.4),
    )
}

#[test]
fn test_merge_is_order_independent() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20 {
        let lexical = random_hits(&mut rng, BackendKind::Lexical, 30);
        let vector = random_hits(&mut rng, BackendKind::Vector, 25);
        let expected = run(lexical.clone(), vector.clone());

        let mut lexical_shuffled = lexical;
        let mut vector_shuffled = vector;
        lexical_shuffled.shuffle(&mut rng);
        vector_shuffled.shuffle(&mut rng);

        assert_eq!(run(lexical_shuffled, vector_shuffled), expected);
    }
}

#[test]
fn test_one_result_per_key() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20 {
        let lexical = random_hits(&mut rng, BackendKind::Lexical, 40);
        let vector = random_hits(&mut rng, BackendKind::Vector, 40);
        let merged = run(lexical, vector);

        let keys: HashSet<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(keys.len(), merged.len());
        for result in &merged {
            assert!(!result.contributing_backends.is_empty());
            assert!((0.0..=1.0).contains(&result.combined_score));
            assert!(result.id.starts_with("/files/"));
        }
    }
}

#[test]
fn test_results_are_sorted() {
    let mut rng = StdRng::seed_from_u64(1234);
    let merged = run(
        random_hits(&mut rng, BackendKind::Lexical, 50),
        random_hits(&mut rng, BackendKind::Vector, 50),
    );

    for pair in merged.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.combined_score > b.combined_score
                || (a.combined_score == b.combined_score && a.id < b.id)
        );
    }
}

#[test]
fn test_normalized_scores_in_unit_range() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut hits = random_hits(&mut rng, BackendKind::Lexical, 30);
    hits.push(SearchHit::new("nan", BackendKind::Lexical, f32::NAN));
    hits.push(SearchHit::new("inf", BackendKind::Lexical, f32::INFINITY));

    let normalized = ScoreNormalizer::new().normalize(hits);
    assert_eq!(normalized.len(), 30);
    assert!(
        normalized
            .iter()
            .all(|n| (0.0..=1.0).contains(&n.normalized_score))
    );
    assert!(normalized.iter().any(|n| n.normalized_score == 1.0));
    assert!(normalized.iter().any(|n| n.normalized_score == 0.0));
}

#[test]
fn test_pages_concatenate_to_full_list() {
    let mut rng = StdRng::seed_from_u64(5);
    let merged = run(
        random_hits(&mut rng, BackendKind::Lexical, 60),
        random_hits(&mut rng, BackendKind::Vector, 60),
    );

    for page_size in [1, 3, 7, 100] {
        let mut collected = Vec::new();
        let mut page = 1;
        loop {
            let slice = Paginator::new(page, page_size).paginate(merged.clone());
            assert_eq!(slice.total, merged.len());
            if slice.items.is_empty() {
                break;
            }
            collected.extend(slice.items);
            page += 1;
        }
        assert_eq!(collected, merged);
    }
}
