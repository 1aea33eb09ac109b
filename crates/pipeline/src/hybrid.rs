//! The HybridCombiner merges content and collaborative results.
//!
//! ## Algorithm
//! 1. Query the content source if a title is given, the collaborative
//!    source if a user is given (up to `n` each)
//! 2. If only one produced anything, return it as is
//! 3. Otherwise concatenate (content first) and drop repeated titles,
//!    keeping the first occurrence
//! 4. Put both signals on a 0-1 scale (`combined_score`): similarity as is,
//!    predicted rating divided by 5
//! 5. Stable sort by `combined_score` descending and keep the top `n`

use crate::traits::{CollaborativeSource, ContentSource};
use data_loader::UserId;
use sources::Recommendation;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Blends a content source and a collaborative source.
///
/// ## Usage
/// ```ignore
/// let combiner = HybridCombiner::new(content, collaborative);
/// let recs = combiner.recommend(Some("Avatar"), Some(42), 10);
/// ```
#[derive(Debug, Clone)]
pub struct HybridCombiner<C, U> {
    content: C,
    collaborative: U,
}

impl<C: ContentSource, U: CollaborativeSource> HybridCombiner<C, U> {
    pub fn new(content: C, collaborative: U) -> Self {
        Self {
            content,
            collaborative,
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn collaborative(&self) -> &U {
        &self.collaborative
    }

    /// Up to `n` results from whichever inputs are present.
    ///
    /// Missing inputs are not errors; with neither the result is empty.
    #[instrument(skip(self))]
    pub fn recommend(
        &self,
        title: Option<&str>,
        user_id: Option<UserId>,
        n: usize,
    ) -> Vec<Recommendation> {
        let content = title
            .map(|title| self.content.similar_to(title, n))
            .unwrap_or_default();
        let collaborative = user_id
            .map(|user_id| self.collaborative.for_user(user_id, n))
            .unwrap_or_default();

        debug!(
            "{}: {} results, {}: {} results",
            self.content.name(),
            content.len(),
            self.collaborative.name(),
            collaborative.len()
        );

        combine(content, collaborative, n)
    }
}

/// Merge two ranked lists into one of at most `n` unique titles
pub fn combine(
    content: Vec<Recommendation>,
    collaborative: Vec<Recommendation>,
    n: usize,
) -> Vec<Recommendation> {
    match (content.is_empty(), collaborative.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => truncated(content, n),
        (true, false) => truncated(collaborative, n),
        (false, false) => {
            let mut seen: HashSet<String> = HashSet::new();
            let mut merged: Vec<Recommendation> = content
                .into_iter()
                .chain(collaborative)
                .filter(|rec| seen.insert(rec.title.clone()))
                .map(|mut rec| {
                    rec.combined_score = Some(rec.score.normalized());
                    rec
                })
                .collect();

            // sort_by is stable: equal scores keep content-first order
            merged.sort_by(|a, b| {
                let a = a.combined_score.unwrap_or(f32::NEG_INFINITY);
                let b = b.combined_score.unwrap_or(f32::NEG_INFINITY);
                b.total_cmp(&a)
            });
            merged.truncate(n);
            merged
        }
    }
}

fn truncated(mut recs: Vec<Recommendation>, n: usize) -> Vec<Recommendation> {
    recs.truncate(n);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::Score;

    fn rec(title: &str, score: Score) -> Recommendation {
        Recommendation {
            movie_id: 0,
            title: title.to_string(),
            genres: vec![],
            vote_average: 7.0,
            overview: String::new(),
            score,
            combined_score: None,
        }
    }

    struct FakeContent(Vec<Recommendation>);

    impl ContentSource for FakeContent {
        fn name(&self) -> &str {
            "fake-content"
        }

        fn similar_to(&self, title: &str, n: usize) -> Vec<Recommendation> {
            if title == "Known" {
                self.0.iter().take(n).cloned().collect()
            } else {
                Vec::new()
            }
        }
    }

    struct FakeCollaborative(Vec<Recommendation>);

    impl CollaborativeSource for FakeCollaborative {
        fn name(&self) -> &str {
            "fake-collaborative"
        }

        fn for_user(&self, user_id: UserId, n: usize) -> Vec<Recommendation> {
            if user_id == 1 {
                self.0.iter().take(n).cloned().collect()
            } else {
                Vec::new()
            }
        }
    }

    fn create_test_combiner() -> HybridCombiner<FakeContent, FakeCollaborative> {
        HybridCombiner::new(
            FakeContent(vec![
                rec("Alien", Score::Content(0.9)),
                rec("Aliens", Score::Content(0.5)),
                rec("Heat", Score::Content(0.3)),
            ]),
            FakeCollaborative(vec![
                rec("Heat", Score::Collaborative(4.5)),
                rec("Up", Score::Collaborative(3.0)),
                rec("Jaws", Score::Collaborative(2.0)),
            ]),
        )
    }

    #[test]
    fn test_both_sources_merged_and_sorted() {
        let combiner = create_test_combiner();
        let recs = combiner.recommend(Some("Known"), Some(1), 10);

        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        // Heat keeps its content score (first occurrence)
        assert_eq!(titles, vec!["Alien", "Up", "Aliens", "Jaws", "Heat"]);
        assert!(recs.iter().all(|r| r.combined_score.is_some()));
        for pair in recs.windows(2) {
            assert!(pair[0].combined_score >= pair[1].combined_score);
        }
        assert_eq!(recs[4].similarity_score(), Some(0.3));
    }

    #[test]
    fn test_truncates_to_n() {
        let combiner = create_test_combiner();
        let recs = combiner.recommend(Some("Known"), Some(1), 2);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Alien");
    }

    #[test]
    fn test_single_source_passes_through() {
        let combiner = create_test_combiner();

        let content_only = combiner.recommend(Some("Known"), None, 2);
        assert_eq!(content_only.len(), 2);
        assert!(content_only.iter().all(|r| r.combined_score.is_none()));

        let collab_only = combiner.recommend(Some("Unknown"), Some(1), 10);
        assert_eq!(collab_only.len(), 3);
        assert_eq!(collab_only[0].title, "Heat");
    }

    #[test]
    fn test_no_inputs_is_empty() {
        let combiner = create_test_combiner();
        assert!(combiner.recommend(None, None, 10).is_empty());
        assert!(combiner.recommend(Some("Unknown"), Some(7), 10).is_empty());
    }

    #[test]
    fn test_equal_scores_keep_content_first() {
        let merged = combine(
            vec![rec("A", Score::Content(0.8))],
            vec![rec("B", Score::Collaborative(4.0))],
            10,
        );
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_title_counts_as_one_title() {
        let merged = combine(
            vec![rec("", Score::Content(0.99)), rec("A", Score::Content(0.5))],
            vec![rec("", Score::Collaborative(1.0)), rec("B", Score::Collaborative(1.0))],
            10,
        );
        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["", "A", "B"]);
        assert_eq!(merged[0].similarity_score(), Some(0.99));
    }
}
