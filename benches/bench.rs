//! Criterion benchmarks for Unisearch.
//!
//! Covers the score fusion pipeline (normalize, merge, paginate) and a full
//! hybrid request against the in-memory backends.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use unisearch::backend::memory::{MemoryDocument, MemoryLexicalBackend, MemoryVectorBackend};
use unisearch::backend::{BackendKind, SearchHit};
use unisearch::config::{BusinessKeyConfig, SearchConfig};
use unisearch::search::{
    BusinessKeyRule, Paginator, QueryDispatcher, ResultMerger, ScoreNormalizer, SearchRequest,
    Weighting,
};

const DIMENSION: usize = 64;

/// Generate hits whose keys overlap with the other backend for about half
/// of the entries.
fn generate_hits(backend: BackendKind, count: usize, offset: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| {
            let score = ((i as f32 * 0.37).sin() * 0.5 + 0.5) * 20.0;
            SearchHit::new(format!("{backend}-{i}"), backend, score)
                .with_field("file_path", format!("/corpus/doc-{}.pdf", i + offset))
                .with_field("file_name", format!("doc-{}.pdf", i + offset))
        })
        .collect()
}

fn generate_embedding(seed: usize) -> Vec<f32> {
    (0..DIMENSION)
        .map(|j| (seed as f32 * 0.1 + j as f32 * 0.01).sin())
        .collect()
}

/// Benchmark normalize + merge + paginate over growing result sets.
fn bench_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion");

    let normalizer = ScoreNormalizer::new();
    let merger = ResultMerger::new(BusinessKeyRule::new(&BusinessKeyConfig::default()).unwrap());
    let weighting = Weighting::new(0.6, 0.4);

    for size in [100, 1000, 5000] {
        let lexical = generate_hits(BackendKind::Lexical, size, 0);
        let vector = generate_hits(BackendKind::Vector, size, size / 2);

        group.throughput(Throughput::Elements((size * 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter_with_setup(
                || (lexical.clone(), vector.clone()),
                |(lexical, vector)| {
                    let merged = merger.merge(
                        normalizer.normalize(black_box(lexical)),
                        normalizer.normalize(black_box(vector)),
                        &weighting,
                    );
                    black_box(Paginator::new(1, 20).paginate(merged))
                },
            )
        });
    }

    group.finish();
}

/// Benchmark a hybrid request end to end against in-memory backends.
fn bench_hybrid_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_request");
    group.sample_size(30);

    let mut lexical = MemoryLexicalBackend::new();
    let mut vector = MemoryVectorBackend::new(DIMENSION);
    for i in 0..2000 {
        let doc = MemoryDocument::new(i.to_string())
            .with_field("file_path", format!("/corpus/doc-{i}.pdf"))
            .with_field("file_name", format!("report-{}.pdf", i % 50))
            .with_field("content", format!("quarterly report section {}", i % 17))
            .with_embedding(generate_embedding(i));
        lexical.add_document(doc.clone());
        vector.add_document(doc).unwrap();
    }

    let config = SearchConfig::new().with_dimension(DIMENSION);
    let dispatcher = QueryDispatcher::new(config, Box::new(lexical), Box::new(vector)).unwrap();
    let request = SearchRequest::hybrid("report section", generate_embedding(7));
    let runtime = Runtime::new().unwrap();

    group.bench_function("memory_backends", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(dispatcher.search(black_box(&request)).await) })
    });

    group.finish();
}

criterion_group!(benches, bench_fusion, bench_hybrid_request);
criterion_main!(benches);
