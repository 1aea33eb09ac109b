//! Engine crate for the CineMatch hybrid recommender.
//!
//! This crate builds every model from the catalog, persists and restores
//! them as artifacts, and exposes the query surface the presentation layer
//! calls.

pub mod config;
pub mod error;
pub mod engine;
pub mod artifacts;

pub use artifacts::{ArtifactStore, ARTIFACT_BLOBS};
pub use config::EngineConfig;
pub use engine::{EngineStats, RecommendationEngine};
pub use error::{ArtifactError, EngineError, Result};
