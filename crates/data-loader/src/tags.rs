//! Tag synthesis.
//!
//! Each movie gets one canonical text tag that feeds the TF-IDF index. The
//! tag must be a pure function of the movie's fields so that rebuilding the
//! similarity index from the same catalog gives the same result.

use crate::types::Movie;

/// Number of overview words kept in a tag
pub const OVERVIEW_WORDS: usize = 20;

/// Lowercase a name and drop its spaces ("Science Fiction" -> "sciencefiction")
fn squash(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Build the tag from its parts.
///
/// Order: first [`OVERVIEW_WORDS`] lowercased overview words, genres,
/// keywords, cast, directors. Tokens are joined with single spaces.
pub fn build_tag(
    overview: &str,
    genres: &[String],
    keywords: &[String],
    cast: &[String],
    directors: &[String],
) -> String {
    let overview = overview.to_lowercase();
    let words = overview
        .split_whitespace()
        .take(OVERVIEW_WORDS)
        .map(str::to_string);

    let names = genres
        .iter()
        .chain(keywords)
        .chain(cast)
        .chain(directors)
        .map(|name| squash(name))
        .filter(|token| !token.is_empty());

    words.chain(names).collect::<Vec<_>>().join(" ")
}

/// Tag for an existing movie; ignores whatever is in `movie.tag`
pub fn synthesize_tag(movie: &Movie) -> String {
    build_tag(
        &movie.overview,
        &movie.genres,
        &movie.keywords,
        &movie.cast,
        &movie.directors,
    )
}
