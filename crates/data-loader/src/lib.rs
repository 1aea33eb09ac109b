//! # Data Loader Crate
//!
//! This crate turns the raw TMDB movies/credits tables into the normalized
//! catalog the recommendation models are built on, and fabricates the
//! synthetic user ratings the collaborative model trains on.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Catalog, raw rows)
//! - **parser**: CSV records and defensive parsing of nested JSON fields
//! - **catalog**: Join, clean and normalize into a [`Catalog`]
//! - **tags**: Canonical text tag per movie
//! - **interactions**: Seeded synthetic user x movie rating matrix
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, generate_interactions, DEFAULT_SEED};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::path::Path;
//!
//! let (catalog, report) = Catalog::load_from_files(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//! let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
//! let ratings = generate_interactions(&catalog, 1000, &mut rng);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod catalog;
pub mod tags;
pub mod interactions;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    ItemIndex,
    MovieId,
    UserId,
    // Core types
    Catalog,
    Movie,
    NormalizeReport,
    RawCredits,
    RawMovie,
};
pub use catalog::normalize;
pub use parser::FieldParse;
pub use tags::synthesize_tag;
pub use interactions::{
    generate_interactions, standard_normal, InteractionMatrix, DEFAULT_SEED, DEFAULT_USER_COUNT,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::default();

        assert_eq!(catalog.len(), 0);
        assert!(catalog.is_empty());
        assert!(catalog.get(0).is_none());
        assert!(catalog.index_of_title("Avatar").is_none());
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_catalog_from_movies() {
        let mut movie = Movie {
            id: 19995,
            title: "Avatar".to_string(),
            overview: "In the 22nd century".to_string(),
            genres: vec!["Action".to_string()],
            keywords: vec![],
            cast: vec![],
            directors: vec!["James Cameron".to_string()],
            vote_average: 7.2,
            vote_count: 11800,
            popularity: 150.4,
            release_date: Some("2009-12-10".to_string()),
            tag: String::new(),
        };
        movie.tag = synthesize_tag(&movie);

        let catalog = Catalog::from_movies(vec![movie]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.index_of_title("Avatar"), Some(0));
        assert_eq!(catalog.titles().collect::<Vec<_>>(), vec!["Avatar"]);
        assert!(catalog.validate().is_ok());
    }
}
