//! Error types for model building.
//!
//! These only surface at build/load time. Query paths never return them;
//! they log and fall back to an empty result instead.

use thiserror::Error;

/// Errors raised while fitting or assembling the recommendation models
#[derive(Error, Debug)]
pub enum ModelError {
    /// Nothing to fit on
    #[error("Cannot fit on empty input: {0}")]
    EmptyInput(String),

    /// Every term was pruned by the document-frequency and stop-word rules
    #[error("Vocabulary is empty after pruning (min_df = {min_df})")]
    EmptyVocabulary { min_df: usize },

    /// Two pieces that must agree on a dimension don't
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A persisted model failed its consistency checks
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
