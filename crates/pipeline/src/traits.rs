//! Core traits for the hybrid combiner.
//!
//! The combiner only needs "give me up to n results" from each signal, so
//! each source sits behind a small trait. The concrete sources from the
//! `sources` crate implement them here; tests drive the combiner with fakes.

use data_loader::UserId;
use sources::{CollaborativeRecommender, ContentRecommender, Recommendation};

/// Item-to-item recommendations keyed by title.
///
/// ## Design Note
/// - `Send + Sync` so a combiner can be shared across query threads
/// - An unknown title is an empty result, never an error
pub trait ContentSource: Send + Sync {
    /// Returns the name of this source (for logging/debugging)
    fn name(&self) -> &str;

    /// Up to `n` movies similar to `title`, best first
    fn similar_to(&self, title: &str, n: usize) -> Vec<Recommendation>;
}

/// Per-user recommendations keyed by user id.
pub trait CollaborativeSource: Send + Sync {
    /// Returns the name of this source (for logging/debugging)
    fn name(&self) -> &str;

    /// Up to `n` unrated movies for `user_id`, best first
    fn for_user(&self, user_id: UserId, n: usize) -> Vec<Recommendation>;
}

impl ContentSource for ContentRecommender {
    fn name(&self) -> &str {
        "content"
    }

    fn similar_to(&self, title: &str, n: usize) -> Vec<Recommendation> {
        self.recommend(title, n)
    }
}

impl CollaborativeSource for CollaborativeRecommender {
    fn name(&self) -> &str {
        "collaborative"
    }

    fn for_user(&self, user_id: UserId, n: usize) -> Vec<Recommendation> {
        self.recommend(user_id, n)
    }
}
