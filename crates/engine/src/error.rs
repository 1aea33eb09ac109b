//! Error types for building, persisting and restoring the engine.

use data_loader::DataLoadError;
use sources::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an engine build
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load catalog: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Failed to build model: {0}")]
    Model(#[from] ModelError),

    /// Two components disagree on the number of movies
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Problems reading or writing one artifact blob
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {path}")]
    Missing { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Blobs decoded but don't fit together
    #[error("Inconsistent artifacts: {0}")]
    Inconsistent(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
