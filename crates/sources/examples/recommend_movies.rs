//! Example: Build both sources and query them
//!
//! Run with: cargo run --package sources --example recommend_movies
//!
//! This example shows how to:
//! 1. Load the TMDB catalog
//! 2. Build the TF-IDF similarity index
//! 3. Generate synthetic ratings and fit the truncated SVD
//! 4. Query content and collaborative recommendations
//! 5. Display the results

use data_loader::{generate_interactions, Catalog, DEFAULT_SEED, DEFAULT_USER_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sources::{
    CollaborativeRecommender, ContentRecommender, SimilarityIndex, SvdConfig, TfidfVectorizer,
    TruncatedSvd,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== CineMatch Source Example ===\n");

    // Load dataset
    println!("Loading TMDB catalog...");
    let start = Instant::now();
    let (catalog, report) = Catalog::load_from_files(
        Path::new("data/tmdb_5000_movies.csv"),
        Path::new("data/tmdb_5000_credits.csv"),
    )?;
    let catalog = Arc::new(catalog);
    println!(
        "Loaded {} movies ({} dropped) in {:?}\n",
        catalog.len(),
        report.dropped_rows,
        start.elapsed()
    );

    // Content source
    println!("Building similarity index...");
    let start = Instant::now();
    let tags: Vec<&str> = catalog.tags().collect();
    let index = SimilarityIndex::fit(&tags, &TfidfVectorizer::new())?;
    println!(
        "Vocabulary of {} terms, built in {:?}",
        index.tfidf().n_terms(),
        start.elapsed()
    );
    let content = ContentRecommender::new(catalog.clone(), Arc::new(index))?;

    // Collaborative source
    println!("Fitting latent factor model...");
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let interactions = generate_interactions(&catalog, DEFAULT_USER_COUNT, &mut rng);
    let mut svd_rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let model = TruncatedSvd::fit(&interactions.to_f64(), &SvdConfig::default(), &mut svd_rng)?;
    println!(
        "Rank {} model explains {:.1}% of variance, fitted in {:?}\n",
        model.rank(),
        model.total_explained_variance_ratio() * 100.0,
        start.elapsed()
    );
    let collab = CollaborativeRecommender::new(catalog.clone(), Arc::new(interactions), Arc::new(model))?;

    // Content query
    let title = "Avatar";
    let start = Instant::now();
    let similar = content.recommend(title, 5);
    println!("Movies similar to '{}' ({:?}):", title, start.elapsed());
    for (i, rec) in similar.iter().enumerate() {
        println!(
            "  {}. {} (similarity: {:.3})",
            i + 1,
            rec.title,
            rec.score.value()
        );
    }

    // Collaborative query
    let user_id = 0;
    let start = Instant::now();
    let predicted = collab.recommend(user_id, 5);
    println!("\nTop picks for user {} ({:?}):", user_id, start.elapsed());
    for (i, rec) in predicted.iter().enumerate() {
        println!(
            "  {}. {} (predicted rating: {:.2})",
            i + 1,
            rec.title,
            rec.score.value()
        );
    }

    Ok(())
}
