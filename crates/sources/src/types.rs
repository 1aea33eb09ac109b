//! Result records handed to the presentation layer.

use data_loader::{Movie, MovieId};
use serde::{Deserialize, Serialize};

/// Maximum overview length (in characters) before it is cut and suffixed
pub const OVERVIEW_SNIPPET_CHARS: usize = 100;

/// Number of genres carried by a record
pub const RECORD_GENRES: usize = 3;

/// Which signal produced a recommendation, with its raw score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Score {
    /// Cosine similarity to the query movie, 0-1
    Content(f32),
    /// Rating reconstructed by the latent factor model, roughly 0-5
    Collaborative(f32),
}

impl Score {
    /// The raw value
    pub fn value(&self) -> f32 {
        match *self {
            Score::Content(similarity) => similarity,
            Score::Collaborative(rating) => rating,
        }
    }

    /// The value on a common 0-1 scale, comparable across sources
    pub fn normalized(&self) -> f32 {
        match *self {
            Score::Content(similarity) => similarity,
            Score::Collaborative(rating) => rating / 5.0,
        }
    }
}

/// One recommended movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    /// First three genres
    pub genres: Vec<String>,
    pub vote_average: f32,
    /// Overview cut to 100 characters plus "..."
    pub overview: String,
    pub score: Score,
    /// Set only by the hybrid combiner, for ranking
    pub combined_score: Option<f32>,
}

impl Recommendation {
    pub fn from_movie(movie: &Movie, score: Score) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            genres: movie.genres.iter().take(RECORD_GENRES).cloned().collect(),
            vote_average: movie.vote_average,
            overview: overview_snippet(&movie.overview),
            score,
            combined_score: None,
        }
    }

    pub fn similarity_score(&self) -> Option<f32> {
        match self.score {
            Score::Content(similarity) => Some(similarity),
            Score::Collaborative(_) => None,
        }
    }

    pub fn predicted_rating(&self) -> Option<f32> {
        match self.score {
            Score::Collaborative(rating) => Some(rating),
            Score::Content(_) => None,
        }
    }
}

/// Cut an overview to [`OVERVIEW_SNIPPET_CHARS`] characters, adding "..." if cut
pub fn overview_snippet(overview: &str) -> String {
    if overview.chars().count() > OVERVIEW_SNIPPET_CHARS {
        let mut snippet: String = overview.chars().take(OVERVIEW_SNIPPET_CHARS).collect();
        snippet.push_str("...");
        snippet
    } else {
        overview.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_snippet() {
        assert_eq!(overview_snippet("short"), "short");

        let exact = "x".repeat(100);
        assert_eq!(overview_snippet(&exact), exact);

        let long = "é".repeat(150);
        let snippet = overview_snippet(&long);
        assert_eq!(snippet.chars().count(), 103);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_score_normalization() {
        assert_eq!(Score::Content(0.42).normalized(), 0.42);
        assert_eq!(Score::Collaborative(4.0).normalized(), 0.8);
        assert_eq!(Score::Collaborative(4.0).value(), 4.0);
    }
}
