use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::UserId;
use engine::{ArtifactStore, EngineConfig, RecommendationEngine, ARTIFACT_BLOBS};
use rand::Rng;
use sources::{Recommendation, Score};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::warn;

/// Movie used by the post-training smoke queries
const SMOKE_TITLE: &str = "Spider-Man";

/// CineMatch - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "cinematch")]
#[command(about = "Movie recommendations from TF-IDF content similarity and SVD collaborative filtering", long_about = None)]
struct Cli {
    /// Directory holding the trained artifacts
    #[arg(short, long, default_value = "artifacts")]
    artifacts: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both models from the TMDB CSV files and save the artifacts
    Train {
        /// Path to the TMDB movies CSV
        #[arg(long, default_value = "data/tmdb_5000_movies.csv")]
        movies: PathBuf,

        /// Path to the TMDB credits CSV
        #[arg(long, default_value = "data/tmdb_5000_credits.csv")]
        credits: PathBuf,

        /// Number of simulated users
        #[arg(long, default_value = "1000")]
        users: usize,

        /// Random seed for the synthetic ratings and the SVD
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of latent factors
        #[arg(long, default_value = "50")]
        rank: usize,

        /// Extra random columns for the SVD range finder
        #[arg(long, default_value = "10")]
        oversamples: usize,

        /// Power iterations for the SVD range finder
        #[arg(long, default_value = "5")]
        power_iterations: usize,
    },

    /// Movies similar to a given title
    Content {
        /// Exact movie title
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show the overview of each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Personalized picks for a simulated user
    Collab {
        /// Simulated user ID (0-based)
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show the overview of each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Blend of content and collaborative recommendations
    Hybrid {
        /// Exact movie title
        #[arg(long)]
        title: Option<String>,

        /// Simulated user ID (0-based)
        #[arg(long)]
        user_id: Option<UserId>,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show the overview of each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of matches
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show dataset and model statistics
    Info {
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run benchmark to test query performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let artifacts = cli.artifacts;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Train {
            movies,
            credits,
            users,
            seed,
            rank,
            oversamples,
            power_iterations,
        } => {
            let config = EngineConfig::default()
                .with_user_count(users)
                .with_seed(seed)
                .with_rank(rank)
                .with_oversamples(oversamples)
                .with_power_iterations(power_iterations);
            handle_train(&artifacts, &movies, &credits, &config)?
        }
        Commands::Content {
            title,
            limit,
            explain,
        } => {
            let engine = load_engine(&artifacts)?;
            let recs = engine.content_recommend(&title, limit);
            print_recommendations(&format!("Movies similar to '{}'", title), &recs, explain);
        }
        Commands::Collab {
            user_id,
            limit,
            explain,
        } => {
            let engine = load_engine(&artifacts)?;
            let recs = engine.collaborative_recommend(user_id, limit);
            print_recommendations(&format!("Picks for user {}", user_id), &recs, explain);
        }
        Commands::Hybrid {
            title,
            user_id,
            limit,
            explain,
        } => handle_hybrid(&load_engine(&artifacts)?, title, user_id, limit, explain),
        Commands::Search { title, limit } => {
            handle_search(&load_engine(&artifacts)?, &title, limit)
        }
        Commands::Info { json } => handle_info(&load_engine(&artifacts)?, json)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(Arc::new(load_engine(&artifacts)?), requests, concurrent).await?,
    }

    Ok(())
}

/// Every command but 'train' serves from saved artifacts
fn load_engine(dir: &Path) -> Result<RecommendationEngine> {
    println!("Loading artifacts from {}...", dir.display());
    let start = Instant::now();
    let engine = ArtifactStore::new(dir).load().ok_or_else(|| {
        anyhow!(
            "No usable artifacts in {}. Run `cinematch train` first.",
            dir.display()
        )
    })?;
    println!("{} Loaded models in {:?}", "✓".green(), start.elapsed());
    Ok(engine)
}

/// Handle the 'train' command
fn handle_train(
    artifacts: &Path,
    movies: &Path,
    credits: &Path,
    config: &EngineConfig,
) -> Result<()> {
    println!("{}", "Training CineMatch hybrid recommender".bold().blue());

    let start = Instant::now();
    let (engine, report) = RecommendationEngine::train(movies, credits, config)
        .with_context(|| {
            format!(
                "Failed to train from {} and {}",
                movies.display(),
                credits.display()
            )
        })?;
    println!("{} Built models in {:?}", "✓".green(), start.elapsed());
    println!("{}Joined rows: {}", "• ".cyan(), report.joined_rows);
    println!("{}Dropped rows: {}", "• ".cyan(), report.dropped_rows);
    println!(
        "{}Unparseable nested fields: {}",
        "• ".cyan(),
        report.field_parse_failures
    );
    println!("{}Movies: {}", "• ".cyan(), engine.catalog().len());

    ArtifactStore::new(artifacts)
        .save(&engine)
        .context("Failed to save artifacts")?;
    println!(
        "{} Saved artifacts to {}:",
        "✓".green(),
        artifacts.display()
    );
    for name in ARTIFACT_BLOBS {
        println!("   - {}", name);
    }

    // Smoke queries
    println!("\n{}", "Testing the system...".bold());
    if engine.find_movie(SMOKE_TITLE).is_none() {
        warn!("'{}' is not in the catalog; content results will be empty", SMOKE_TITLE);
    }
    let user: UserId = 0;
    print_recommendations(
        &format!("Content-based for '{}'", SMOKE_TITLE),
        &engine.content_recommend(SMOKE_TITLE, 3),
        false,
    );
    print_recommendations(
        &format!("Collaborative for user {}", user),
        &engine.collaborative_recommend(user, 3),
        false,
    );
    print_recommendations(
        &format!("Hybrid for '{}' and user {}", SMOKE_TITLE, user),
        &engine.hybrid_recommend(Some(SMOKE_TITLE), Some(user), 3),
        false,
    );

    Ok(())
}

/// Handle the 'hybrid' command
fn handle_hybrid(
    engine: &RecommendationEngine,
    title: Option<String>,
    user_id: Option<UserId>,
    limit: usize,
    explain: bool,
) {
    let header = hybrid_header(title.as_deref(), user_id);
    let recs = engine.hybrid_recommend(title.as_deref(), user_id, limit);
    print_recommendations(&header, &recs, explain);
}

/// Missing inputs are not an error; the query just comes back empty
fn hybrid_header(title: Option<&str>, user_id: Option<UserId>) -> String {
    match (title, user_id) {
        (Some(title), Some(user)) => format!("Hybrid picks for '{}' and user {}", title, user),
        (Some(title), None) => format!("Hybrid picks for '{}'", title),
        (None, Some(user)) => format!("Hybrid picks for user {}", user),
        (None, None) => "Hybrid picks (no --title or --user-id given)".to_string(),
    }
}

/// Handle the 'search' command
fn handle_search(engine: &RecommendationEngine, title: &str, limit: usize) {
    let matches = engine.search(title, limit);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("{}", "No matching titles".yellow());
        return;
    }
    for movie in matches {
        let year = movie
            .year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}: {} ({}) [{}] ⭐ {:.1} ({} votes)",
            movie.id,
            movie.title,
            year,
            movie.genres.join(", "),
            movie.vote_average,
            movie.vote_count
        );
    }
}

/// Handle the 'info' command
fn handle_info(engine: &RecommendationEngine, json: bool) -> Result<()> {
    let stats = engine.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Dataset Statistics:".bold().blue());
    println!("{}Total Movies: {}", "• ".green(), stats.movie_count);
    println!("{}Simulated Users: {}", "• ".green(), stats.user_count);
    println!(
        "{}User-Movie Matrix: {} x {} ({} ratings, density {:.4})",
        "• ".green(),
        stats.interaction_shape.0,
        stats.interaction_shape.1,
        stats.rated_count,
        stats.interaction_density
    );

    println!("{}", "Content-Based Model:".bold().blue());
    println!("{}Vocabulary: {} terms", "• ".cyan(), stats.vocabulary_size);
    println!(
        "{}Similarity Matrix: {} x {} ({:.1} MB)",
        "• ".cyan(),
        stats.similarity_shape.0,
        stats.similarity_shape.1,
        stats.similarity_bytes as f64 / 1_000_000.0
    );

    println!("{}", "Collaborative Filtering Model:".bold().blue());
    println!("{}SVD Components: {}", "• ".cyan(), stats.svd_rank);
    println!(
        "{}Explained Variance: {:.3}",
        "• ".cyan(),
        stats.explained_variance_ratio
    );
    println!(
        "{}Top {} Components Variance: {:.3}",
        "• ".cyan(),
        stats.top_component_ratios.len(),
        stats.top_component_ratios.iter().sum::<f64>()
    );

    println!("{}", "Sample Movie Data:".bold().blue());
    for movie in engine.catalog().movies().iter().take(5) {
        let genres = if movie.genres.is_empty() {
            "N/A".to_string()
        } else {
            movie.genres.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
        };
        println!(
            "{}{} | {} | ⭐ {:.1} | popularity {:.1}",
            "• ".green(),
            movie.title,
            genres,
            movie.vote_average,
            movie.popularity
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let movie_count = engine.catalog().len();
    let user_count = engine.interactions().user_count();

    // Random (title, user) pairs, cycling through the three query kinds
    let queries: Vec<(usize, String, UserId)> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|i| {
                let title = engine
                    .catalog()
                    .get(rng.random_range(0..movie_count))
                    .map(|m| m.title.clone())
                    .unwrap_or_default();
                let user = rng.random_range(0..user_count.max(1)) as UserId;
                (i % 3, title, user)
            })
            .collect()
    };

    // Use tokio::spawn to make concurrent requests, capped by a semaphore
    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_start = Instant::now();
    let mut handles = vec![];
    for (kind, title, user) in queries {
        let engine = engine.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let start = Instant::now();
            tokio::task::spawn_blocking(move || match kind {
                0 => engine.content_recommend(&title, 10),
                1 => engine.collaborative_recommend(user, 10),
                _ => engine.hybrid_recommend(Some(&title), Some(user), 10),
            })
            .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = wall_start.elapsed();

    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(header: &str, recommendations: &[Recommendation], explain: bool) {
    println!("{}", format!("{}:", header).bold().blue());
    if recommendations.is_empty() {
        println!("{}", "No recommendations found".yellow());
        return;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        let score = match rec.score {
            Score::Content(similarity) => format!("Similarity: {:.3}", similarity),
            Score::Collaborative(rating) => format!("Predicted Rating: {:.2}/5.0", rating),
        };
        println!(
            "{}. {} [{}] - {} - ⭐ {:.1}/10",
            (i + 1).to_string().green(),
            rec.title,
            rec.genres.join(", "),
            score,
            rec.vote_average
        );
        if explain {
            println!("   {}", rec.overview.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_without_inputs_parses() {
        let cli = Cli::try_parse_from(["cinematch", "hybrid"]).unwrap();
        match cli.command {
            Commands::Hybrid { title, user_id, .. } => {
                assert!(title.is_none());
                assert!(user_id.is_none());
                assert!(hybrid_header(title.as_deref(), user_id).contains("no --title"));
            }
            _ => panic!("expected the hybrid command"),
        }
    }

    #[test]
    fn test_hybrid_header_names_inputs() {
        assert_eq!(
            hybrid_header(Some("Alien"), Some(3)),
            "Hybrid picks for 'Alien' and user 3"
        );
        assert_eq!(hybrid_header(None, Some(3)), "Hybrid picks for user 3");
    }

    #[test]
    fn test_train_accepts_range_finder_flags() {
        let cli = Cli::try_parse_from([
            "cinematch",
            "train",
            "--oversamples",
            "4",
            "--power-iterations",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Train {
                oversamples,
                power_iterations,
                rank,
                ..
            } => {
                assert_eq!((oversamples, power_iterations, rank), (4, 2, 50));
            }
            _ => panic!("expected the train command"),
        }
    }
}
