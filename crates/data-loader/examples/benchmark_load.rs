use data_loader::{Catalog, DEFAULT_SEED, DEFAULT_USER_COUNT, generate_interactions};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::time::Instant;

fn main() {
    let movies_path = Path::new("data/tmdb_5000_movies.csv");
    let credits_path = Path::new("data/tmdb_5000_credits.csv");

    println!("Loading TMDB catalog...\n");

    let start = Instant::now();
    let (catalog, report) = Catalog::load_from_files(movies_path, credits_path)
        .expect("Failed to load dataset");
    let load_elapsed = start.elapsed();

    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
    let interactions = generate_interactions(&catalog, DEFAULT_USER_COUNT, &mut rng);
    let generate_elapsed = start.elapsed();

    println!("\n=== Load Complete ===");
    println!("Load time: {:?}", load_elapsed);
    println!("Movies: {}", catalog.len());
    println!("Joined rows: {}", report.joined_rows);
    println!("Dropped rows: {}", report.dropped_rows);
    println!("Unparseable nested fields: {}", report.field_parse_failures);
    println!("\nInteraction matrix: {:?} in {:?}", interactions.shape(), generate_elapsed);
    println!("Ratings: {} (density {:.4})", interactions.rated_count(), interactions.density());
}
