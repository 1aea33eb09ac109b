//! Persistence of a trained engine as five named JSON blobs.
//!
//! Loading is all-or-nothing: every blob is read, decoded and cross-checked
//! into locals before an engine exists, so a partial directory never yields
//! a half-built engine.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::engine::RecommendationEngine;
use crate::error::{ArtifactError, Result};
use data_loader::{Catalog, InteractionMatrix, Movie};
use ndarray::Array2;
use sources::{SimilarityIndex, TfidfMatrix, TruncatedSvd};

pub const MOVIES_BLOB: &str = "processed_movies.json";
pub const SIMILARITY_BLOB: &str = "similarity_matrix.json";
pub const TFIDF_BLOB: &str = "tfidf_matrix.json";
pub const SVD_BLOB: &str = "svd_model.json";
pub const INTERACTIONS_BLOB: &str = "user_movie_matrix.json";

/// Every blob a complete artifact directory holds
pub const ARTIFACT_BLOBS: [&str; 5] = [
    MOVIES_BLOB,
    SIMILARITY_BLOB,
    TFIDF_BLOB,
    SVD_BLOB,
    INTERACTIONS_BLOB,
];

/// A directory of engine artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True if all five blobs are present (they may still be invalid)
    pub fn exists(&self) -> bool {
        ARTIFACT_BLOBS.iter().all(|name| self.dir.join(name).is_file())
    }

    /// Write the engine's state, creating the directory if needed.
    ///
    /// Each blob goes to a temporary file first and is renamed into place.
    pub fn save(&self, engine: &RecommendationEngine) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let index = engine.similarity_index();
        self.write_blob(MOVIES_BLOB, engine.catalog().movies())?;
        self.write_blob(SIMILARITY_BLOB, index.similarity())?;
        self.write_blob(TFIDF_BLOB, index.tfidf())?;
        self.write_blob(SVD_BLOB, engine.model())?;
        self.write_blob(INTERACTIONS_BLOB, engine.interactions())?;

        info!("Saved artifacts to {:?}", self.dir);
        Ok(())
    }

    /// Restore a trained engine.
    ///
    /// `None` if any blob is missing, malformed, or inconsistent with the
    /// others; the reason is logged.
    pub fn load(&self) -> Option<RecommendationEngine> {
        match self.try_load() {
            Ok(engine) => {
                info!(
                    "Loaded artifacts from {:?} ({} movies)",
                    self.dir,
                    engine.catalog().len()
                );
                Some(engine)
            }
            Err(e) => {
                warn!("Could not load artifacts from {:?}: {}", self.dir, e);
                None
            }
        }
    }

    fn try_load(&self) -> std::result::Result<RecommendationEngine, ArtifactError> {
        let movies: Vec<Movie> = self.read_blob(MOVIES_BLOB)?;
        let similarity: Array2<f32> = self.read_blob(SIMILARITY_BLOB)?;
        let tfidf: TfidfMatrix = self.read_blob(TFIDF_BLOB)?;
        let model: TruncatedSvd = self.read_blob(SVD_BLOB)?;
        let interactions: InteractionMatrix = self.read_blob(INTERACTIONS_BLOB)?;

        model
            .validate()
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;
        let index = SimilarityIndex::from_parts(tfidf, similarity)
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;

        RecommendationEngine::assemble(Catalog::from_movies(movies), interactions, index, model)
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))
    }

    fn write_blob<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> std::result::Result<(), ArtifactError> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        let io_err = |source| ArtifactError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value).map_err(|source| {
            ArtifactError::Serialization {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)?;
        drop(writer);
        fs::rename(&tmp, &path).map_err(io_err)?;

        debug!("Wrote {:?}", path);
        Ok(())
    }

    fn read_blob<T: DeserializeOwned>(&self, name: &str) -> std::result::Result<T, ArtifactError> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(ArtifactError::Missing { path });
        }
        let file = File::open(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ArtifactError::Serialization {
                path: path.clone(),
                source,
            })?;
        debug!("Read {:?}", path);
        Ok(value)
    }
}
