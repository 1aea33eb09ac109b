//! # Recommendation Engine
//!
//! This module owns every built component and exposes the query surface:
//! 1. Load and normalize the catalog
//! 2. Generate the synthetic interaction matrix
//! 3. Fit the TF-IDF similarity index and the truncated SVD (in parallel)
//! 4. Cross-check dimensions and wire up the sources
//! 5. Answer content, collaborative and hybrid queries
//!
//! Everything is read-only after the build. Components sit behind `Arc`, so
//! cloning the engine is cheap and clones can serve queries from any thread.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use data_loader::{generate_interactions, Catalog, InteractionMatrix, Movie, NormalizeReport, UserId};
use pipeline::HybridCombiner;
use sources::{
    CollaborativeRecommender, ContentRecommender, Recommendation, SimilarityIndex, TruncatedSvd,
};

/// Number of leading components listed in [`EngineStats`]
const TOP_COMPONENTS: usize = 5;

/// Summary of a built engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub movie_count: usize,
    pub user_count: usize,
    pub interaction_shape: (usize, usize),
    pub rated_count: usize,
    pub interaction_density: f64,
    pub vocabulary_size: usize,
    pub similarity_shape: (usize, usize),
    pub svd_rank: usize,
    pub explained_variance_ratio: f64,
    /// Explained variance ratio of the leading components
    pub top_component_ratios: Vec<f64>,
    pub similarity_bytes: usize,
    pub interaction_bytes: usize,
}

/// Main engine that holds the trained models
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    interactions: Arc<InteractionMatrix>,
    similarity: Arc<SimilarityIndex>,
    model: Arc<TruncatedSvd>,
    hybrid: HybridCombiner<ContentRecommender, CollaborativeRecommender>,
}

impl RecommendationEngine {
    /// Build everything from the two TMDB CSV files
    pub fn train(
        movies_path: &Path,
        credits_path: &Path,
        config: &EngineConfig,
    ) -> Result<(Self, NormalizeReport)> {
        let (catalog, report) = Catalog::load_from_files(movies_path, credits_path)?;
        let engine = Self::from_catalog(catalog, config)?;
        Ok((engine, report))
    }

    /// Build the models for an already normalized catalog
    pub fn from_catalog(catalog: Catalog, config: &EngineConfig) -> Result<Self> {
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        let start_time = Instant::now();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let interactions = generate_interactions(&catalog, config.user_count, &mut rng);

        // Content and latent models are independent; fit them in parallel
        let vectorizer = config.vectorizer();
        let (similarity, model) = {
            let tags: Vec<&str> = catalog.tags().collect();
            let ratings = interactions.to_f64();
            rayon::join(
                || SimilarityIndex::fit(&tags, &vectorizer),
                || {
                    let mut svd_rng = StdRng::seed_from_u64(config.seed);
                    TruncatedSvd::fit(&ratings, &config.svd, &mut svd_rng)
                },
            )
        };

        let engine = Self::assemble(catalog, interactions, similarity?, model?)?;
        info!(
            "Engine built in {:.2?}: {} movies, {} users",
            start_time.elapsed(),
            engine.catalog.len(),
            engine.interactions.user_count()
        );
        Ok(engine)
    }

    /// Wire up built components after checking they agree on dimensions
    pub fn assemble(
        catalog: Catalog,
        interactions: InteractionMatrix,
        similarity: SimilarityIndex,
        model: TruncatedSvd,
    ) -> Result<Self> {
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        catalog.validate()?;

        let items = catalog.len();
        for (what, found) in [
            ("interaction matrix columns", interactions.item_count()),
            ("similarity matrix rows", similarity.len()),
            ("TF-IDF rows", similarity.tfidf().n_docs()),
            ("latent model items", model.n_items()),
        ] {
            if found != items {
                return Err(EngineError::DimensionMismatch {
                    what: what.to_string(),
                    expected: items,
                    found,
                });
            }
        }

        let catalog = Arc::new(catalog);
        let interactions = Arc::new(interactions);
        let similarity = Arc::new(similarity);
        let model = Arc::new(model);

        let content = ContentRecommender::new(catalog.clone(), similarity.clone())?;
        let collaborative =
            CollaborativeRecommender::new(catalog.clone(), interactions.clone(), model.clone())?;

        Ok(Self {
            catalog,
            interactions,
            similarity,
            model,
            hybrid: HybridCombiner::new(content, collaborative),
        })
    }

    /// Up to `n` movies similar to `title`; `[]` for an unknown title
    pub fn content_recommend(&self, title: &str, n: usize) -> Vec<Recommendation> {
        self.hybrid.content().recommend(title, n)
    }

    /// Up to `n` unrated movies for `user_id`; `[]` for an unknown or
    /// fully-rated user
    pub fn collaborative_recommend(&self, user_id: UserId, n: usize) -> Vec<Recommendation> {
        self.hybrid.collaborative().recommend(user_id, n)
    }

    /// Blend of both signals for whichever inputs are given
    pub fn hybrid_recommend(
        &self,
        title: Option<&str>,
        user_id: Option<UserId>,
        n: usize,
    ) -> Vec<Recommendation> {
        self.hybrid.recommend(title, user_id, n)
    }

    /// All titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.catalog.titles()
    }

    /// First movie with exactly this title
    pub fn find_movie(&self, title: &str) -> Option<&Movie> {
        self.catalog
            .index_of_title(title)
            .and_then(|idx| self.catalog.get(idx))
    }

    /// Case-insensitive title search, exact matches first
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Movie> {
        self.catalog
            .search(query, limit)
            .into_iter()
            .filter_map(|idx| self.catalog.get(idx))
            .collect()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    pub fn similarity_index(&self) -> &SimilarityIndex {
        &self.similarity
    }

    pub fn model(&self) -> &TruncatedSvd {
        &self.model
    }

    pub fn stats(&self) -> EngineStats {
        let (users, items) = self.interactions.shape();
        EngineStats {
            movie_count: self.catalog.len(),
            user_count: users,
            interaction_shape: (users, items),
            rated_count: self.interactions.rated_count(),
            interaction_density: self.interactions.density(),
            vocabulary_size: self.similarity.tfidf().n_terms(),
            similarity_shape: self.similarity.similarity().dim(),
            svd_rank: self.model.rank(),
            explained_variance_ratio: self.model.total_explained_variance_ratio(),
            top_component_ratios: self
                .model
                .explained_variance_ratio()
                .iter()
                .take(TOP_COMPONENTS)
                .copied()
                .collect(),
            similarity_bytes: self.similarity.similarity().len() * std::mem::size_of::<f32>(),
            interaction_bytes: users * items,
        }
    }
}
