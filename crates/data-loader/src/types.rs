//! Core domain types for the movie catalog.
//!
//! The catalog is built once from the TMDB movies/credits tables and is
//! read-only afterwards. Every downstream model addresses movies by their
//! position in the catalog (`ItemIndex`), never by the TMDB id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// TMDB identifier of a movie (the `movie_id` column)
pub type MovieId = u32;

/// Synthetic user identifier, a row index into the interaction matrix
pub type UserId = u32;

/// Position of a movie in the normalized catalog (0..N-1)
pub type ItemIndex = usize;

// =============================================================================
// Raw rows, as read from the CSV files
// =============================================================================

/// One row of the movies table, restricted to the working columns.
///
/// Text cells that were empty in the file are `None`; the normalizer drops
/// rows missing `overview`, `genres` or `keywords`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMovie {
    /// `movie_id` or TMDB's `id` column, when the movies file carries one
    pub movie_id: Option<MovieId>,
    pub title: String,
    pub overview: Option<String>,
    pub genres: Option<String>,
    pub keywords: Option<String>,
    pub vote_average: f32,
    pub vote_count: u32,
    pub popularity: f32,
    pub release_date: Option<String>,
}

/// One row of the credits table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCredits {
    pub movie_id: Option<MovieId>,
    pub title: String,
    pub cast: Option<String>,
    pub crew: Option<String>,
}

// =============================================================================
// Movie
// =============================================================================

/// A normalized catalog entry.
///
/// `tag` is derived from the other fields by [`crate::tags::synthesize_tag`]
/// and is stored only so that it survives artifact round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    /// Top 3 billed actors
    pub cast: Vec<String>,
    /// Up to 2 directors
    pub directors: Vec<String>,
    /// 0-10
    pub vote_average: f32,
    pub vote_count: u32,
    pub popularity: f32,
    pub release_date: Option<String>,
    pub tag: String,
}

impl Movie {
    /// Release year parsed from `release_date` ("2009-12-10" -> 2009)
    pub fn year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
    }
}

// =============================================================================
// Normalization report
// =============================================================================

/// Bookkeeping from a normalization run.
///
/// Nested-field parse failures never abort a row, so this is where they
/// become visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows produced by the title join
    pub joined_rows: usize,
    /// Joined rows discarded for a missing overview, genres or keywords
    pub dropped_rows: usize,
    /// Nested fields that degraded to an empty list
    pub field_parse_failures: usize,
}

// =============================================================================
// Catalog
// =============================================================================

/// The normalized movie catalog.
///
/// Owns the movies in index order plus a title lookup. Titles are not
/// guaranteed unique; lookups resolve to the first movie with that title.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
    title_index: HashMap<String, ItemIndex>,
}

impl Catalog {
    /// Build a catalog from movies already in their final order
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let mut title_index = HashMap::with_capacity(movies.len());
        for (idx, movie) in movies.iter().enumerate() {
            // First occurrence wins
            title_index.entry(movie.title.clone()).or_insert(idx);
        }
        Self {
            movies,
            title_index,
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Get a movie by catalog position
    pub fn get(&self, idx: ItemIndex) -> Option<&Movie> {
        self.movies.get(idx)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Catalog position of the first movie with exactly this title
    pub fn index_of_title(&self, title: &str) -> Option<ItemIndex> {
        self.title_index.get(title).copied()
    }

    /// Iterate titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    /// Iterate tags in catalog order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.tag.as_str())
    }

    /// Case-insensitive title search.
    ///
    /// Exact matches come first, then substring matches; within each group
    /// higher `vote_average` ranks first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ItemIndex> {
        let query = query.to_lowercase();
        let mut matches: Vec<(u8, ItemIndex)> = self
            .movies
            .iter()
            .enumerate()
            .filter_map(|(idx, movie)| {
                let title = movie.title.to_lowercase();
                if title == query {
                    Some((0, idx))
                } else if title.contains(&query) {
                    Some((1, idx))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0).then_with(|| {
                self.movies[b.1]
                    .vote_average
                    .total_cmp(&self.movies[a.1].vote_average)
            })
        });
        matches.truncate(limit);
        matches.into_iter().map(|(_, idx)| idx).collect()
    }

    /// Give the movies back, e.g. for persisting them
    pub fn into_movies(self) -> Vec<Movie> {
        self.movies
    }
}
