//! # Sources Crate
//!
//! This crate implements the two recommendation signals the engine blends.
//!
//! ## Components
//!
//! ### Content Source
//! TF-IDF over each movie's tag, then cosine similarity between every pair:
//! - "Movies that read like this one"
//! - Dense `items x items` matrix computed once at build time
//!
//! ### Collaborative Source
//! Rank-50 truncated SVD of the synthetic user x movie ratings:
//! - "Users with ratings like yours would rate these highly"
//! - Predicts a rating for every movie the user hasn't rated
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CollaborativeRecommender, ContentRecommender, SimilarityIndex, SvdConfig,
//!               TfidfVectorizer, TruncatedSvd};
//! use std::sync::Arc;
//!
//! let tags: Vec<&str> = catalog.tags().collect();
//! let index = SimilarityIndex::fit(&tags, &TfidfVectorizer::new())?;
//! let content = ContentRecommender::new(catalog.clone(), Arc::new(index))?;
//!
//! let model = TruncatedSvd::fit(&interactions.to_f64(), &SvdConfig::default(), &mut rng)?;
//! let collab = CollaborativeRecommender::new(catalog, interactions, Arc::new(model))?;
//!
//! let similar = content.recommend("Avatar", 10);
//! let for_user = collab.recommend(0, 10);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod stop_words;
pub mod vectorizer;
pub mod content;
pub mod latent;
pub mod collaborative;

// Re-export commonly used types
pub use error::{ModelError, Result};
pub use types::{overview_snippet, Recommendation, Score};
pub use vectorizer::{SparseVector, TfidfMatrix, TfidfVectorizer};
pub use content::{cosine_similarity_matrix, ContentRecommender, SimilarityIndex};
pub use latent::{SvdConfig, TruncatedSvd};
pub use collaborative::CollaborativeRecommender;
