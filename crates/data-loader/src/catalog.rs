//! Catalog building: join, clean and normalize the raw tables.
//!
//! Steps:
//! 1. Parse the movies and credits files (in parallel)
//! 2. Inner-join them on `title`
//! 3. Drop rows missing `overview`, `genres` or `keywords`
//! 4. Flatten the nested fields into name lists
//! 5. Synthesize each movie's tag

use crate::error::{DataLoadError, Result};
use crate::parser::{self, FieldParse};
use crate::tags::synthesize_tag;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

impl Catalog {
    /// Load and normalize the catalog from the two TMDB CSV files
    pub fn load_from_files(movies_path: &Path, credits_path: &Path) -> Result<(Self, NormalizeReport)> {
        info!(
            "Loading catalog from {:?} and {:?}",
            movies_path, credits_path
        );

        // Parse both files IN PARALLEL using Rayon
        let (movies, credits) = rayon::join(
            || parser::parse_movies(movies_path),
            || parser::parse_credits(credits_path),
        );
        let movies = movies?;
        let credits = credits?;

        info!(
            "Parsed {} movie rows and {} credit rows",
            movies.len(),
            credits.len()
        );

        let (catalog, report) = normalize(movies, credits);
        catalog.validate()?;

        info!(
            "Catalog ready: {} movies ({} joined, {} dropped, {} nested fields unparseable)",
            catalog.len(),
            report.joined_rows,
            report.dropped_rows,
            report.field_parse_failures
        );
        Ok((catalog, report))
    }

    /// Check the invariants every downstream model relies on
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(DataLoadError::ValidationError(
                "catalog is empty after normalization".to_string(),
            ));
        }
        for movie in self.movies() {
            if movie.tag != synthesize_tag(movie) {
                return Err(DataLoadError::ValidationError(format!(
                    "tag of '{}' does not match its fields",
                    movie.title
                )));
            }
        }
        Ok(())
    }
}

/// Join, filter and flatten the raw rows into a catalog.
///
/// The join keeps movies-file order; a title present several times in the
/// credits file produces one row per credits match, in credits order.
pub fn normalize(movies: Vec<RawMovie>, credits: Vec<RawCredits>) -> (Catalog, NormalizeReport) {
    let mut credits_by_title: HashMap<&str, Vec<&RawCredits>> = HashMap::new();
    for credit in &credits {
        credits_by_title
            .entry(credit.title.as_str())
            .or_default()
            .push(credit);
    }

    let mut report = NormalizeReport::default();
    let mut normalized = Vec::new();

    for raw in &movies {
        let Some(matches) = credits_by_title.get(raw.title.as_str()) else {
            continue;
        };
        for credit in matches {
            report.joined_rows += 1;

            let (Some(overview), Some(genres), Some(keywords)) =
                (&raw.overview, &raw.genres, &raw.keywords)
            else {
                report.dropped_rows += 1;
                continue;
            };

            let mut take = |field: &str, parsed: FieldParse| -> Vec<String> {
                if let Some(reason) = &parsed.error {
                    report.field_parse_failures += 1;
                    debug!("Unparseable {} for '{}': {}", field, raw.title, reason);
                }
                parsed.tokens
            };

            let genres = take("genres", parser::parse_named_entities(Some(genres)));
            let keywords = take("keywords", parser::parse_named_entities(Some(keywords)));
            let cast = take("cast", parser::parse_cast(credit.cast.as_deref()));
            let directors = take("crew", parser::parse_directors(credit.crew.as_deref()));

            let mut movie = Movie {
                id: credit.movie_id.or(raw.movie_id).unwrap_or_default(),
                title: raw.title.clone(),
                overview: overview.clone(),
                genres,
                keywords,
                cast,
                directors,
                vote_average: raw.vote_average,
                vote_count: raw.vote_count,
                popularity: raw.popularity,
                release_date: raw.release_date.clone(),
                tag: String::new(),
            };
            movie.tag = synthesize_tag(&movie);
            normalized.push(movie);
        }
    }

    if report.field_parse_failures > 0 {
        warn!(
            "{} nested fields could not be parsed and were left empty",
            report.field_parse_failures
        );
    }

    (Catalog::from_movies(normalized), report)
}
