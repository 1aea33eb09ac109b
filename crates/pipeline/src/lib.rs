//! Pipeline for blending content and collaborative recommendations.
//!
//! This crate provides:
//! - `ContentSource` / `CollaborativeSource` traits over the two signals
//! - `HybridCombiner` for merging, de-duplicating and ranking their results
//!
//! ## Architecture
//! The pipeline processes a query in stages:
//! 1. Each present input (title, user) is sent to its source
//! 2. Results are concatenated content-first and de-duplicated by title
//! 3. Scores are put on a common 0-1 scale and the list is re-ranked
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::HybridCombiner;
//!
//! let combiner = HybridCombiner::new(content_recommender, collaborative_recommender);
//! let recs = combiner.recommend(Some("The Dark Knight"), Some(7), 10);
//! ```

pub mod traits;
pub mod hybrid;

// Re-export main types
pub use traits::{CollaborativeSource, ContentSource};
pub use hybrid::{combine, HybridCombiner};
