//! Benchmarks for model building and recommendation queries
//!
//! Run with: cargo bench --package sources
//!
//! This will benchmark both sources on the full TMDB 5000 dataset.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{generate_interactions, Catalog, DEFAULT_SEED, DEFAULT_USER_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sources::{
    CollaborativeRecommender, ContentRecommender, SimilarityIndex, SvdConfig, TfidfVectorizer,
    TruncatedSvd,
};
use std::path::Path;
use std::sync::Arc;

fn load_test_data() -> Arc<Catalog> {
    let (catalog, _) = Catalog::load_from_files(
        Path::new("../../data/tmdb_5000_movies.csv"),
        Path::new("../../data/tmdb_5000_credits.csv"),
    )
    .expect("Failed to load test data");
    Arc::new(catalog)
}

fn bench_tfidf_fit(c: &mut Criterion) {
    let catalog = load_test_data();
    let tags: Vec<&str> = catalog.tags().collect();
    let vectorizer = TfidfVectorizer::new();

    c.bench_function("tfidf_fit_transform", |b| {
        b.iter(|| black_box(vectorizer.fit_transform(black_box(&tags)).unwrap()))
    });
}

fn bench_content_recommend(c: &mut Criterion) {
    let catalog = load_test_data();
    let tags: Vec<&str> = catalog.tags().collect();
    let index = SimilarityIndex::fit(&tags, &TfidfVectorizer::new()).unwrap();
    let content = ContentRecommender::new(catalog.clone(), Arc::new(index)).unwrap();

    // Use the first movie as the query
    let title = catalog.get(0).map(|m| m.title.clone()).unwrap_or_default();

    c.bench_function("content_recommend", |b| {
        b.iter(|| black_box(content.recommend(black_box(&title), black_box(10))))
    });
}

fn bench_collaborative_recommend(c: &mut Criterion) {
    let catalog = load_test_data();
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let interactions = generate_interactions(&catalog, DEFAULT_USER_COUNT, &mut rng);
    let mut svd_rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let model =
        TruncatedSvd::fit(&interactions.to_f64(), &SvdConfig::default(), &mut svd_rng).unwrap();
    let collab =
        CollaborativeRecommender::new(catalog, Arc::new(interactions), Arc::new(model)).unwrap();

    c.bench_function("collaborative_recommend", |b| {
        b.iter(|| black_box(collab.recommend(black_box(1), black_box(10))))
    });
}

criterion_group!(
    benches,
    bench_tfidf_fit,
    bench_content_recommend,
    bench_collaborative_recommend
);
criterion_main!(benches);
