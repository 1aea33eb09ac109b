//! Collaborative Source - latent factor predictions for unrated movies
//!
//! "Users with ratings like yours would rate these highly"
//!
//! ## Algorithm
//! 1. Look up the user's row in the interaction matrix
//! 2. Reconstruct it through the truncated SVD (project, then expand)
//! 3. Keep only movies the user has not rated
//! 4. Rank by predicted rating, descending (ties by item index)

use crate::error::{ModelError, Result};
use crate::latent::TruncatedSvd;
use crate::types::{Recommendation, Score};
use data_loader::{Catalog, InteractionMatrix, ItemIndex, UserId};
use ndarray::Array1;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Collaborative recommender over the synthetic ratings and a fitted model
#[derive(Debug, Clone)]
pub struct CollaborativeRecommender {
    catalog: Arc<Catalog>,
    interactions: Arc<InteractionMatrix>,
    model: Arc<TruncatedSvd>,
}

impl CollaborativeRecommender {
    pub fn new(
        catalog: Arc<Catalog>,
        interactions: Arc<InteractionMatrix>,
        model: Arc<TruncatedSvd>,
    ) -> Result<Self> {
        if interactions.item_count() != catalog.len() {
            return Err(ModelError::DimensionMismatch {
                what: "interaction matrix columns".to_string(),
                expected: catalog.len(),
                found: interactions.item_count(),
            });
        }
        if model.n_items() != catalog.len() {
            return Err(ModelError::DimensionMismatch {
                what: "latent model items".to_string(),
                expected: catalog.len(),
                found: model.n_items(),
            });
        }
        Ok(Self {
            catalog,
            interactions,
            model,
        })
    }

    pub fn model(&self) -> &TruncatedSvd {
        &self.model
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    /// Predicted rating for every movie, or `None` for an unknown user
    pub fn predict(&self, user_id: UserId) -> Option<Array1<f64>> {
        let row = self.interactions.user_row(user_id)?.mapv(f64::from);
        match self.model.reconstruct(row.view()) {
            Ok(predicted) => Some(predicted),
            Err(e) => {
                warn!("Failed to reconstruct ratings for user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Up to `n` unrated movies with the highest predicted rating
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId, n: usize) -> Vec<Recommendation> {
        let Some(row) = self.interactions.user_row(user_id) else {
            debug!("User out of range");
            return Vec::new();
        };

        let unrated: Vec<ItemIndex> = row
            .iter()
            .enumerate()
            .filter(|&(_, &rating)| rating == 0)
            .map(|(item, _)| item)
            .collect();
        if unrated.is_empty() {
            debug!("User has rated every movie");
            return Vec::new();
        }

        let Some(predicted) = self.predict(user_id) else {
            return Vec::new();
        };

        let mut scored: Vec<(ItemIndex, f64)> =
            unrated.into_iter().map(|item| (item, predicted[item])).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(n);

        let recommendations: Vec<Recommendation> = scored
            .into_iter()
            .filter_map(|(item, rating)| {
                self.catalog
                    .get(item)
                    .map(|movie| Recommendation::from_movie(movie, Score::Collaborative(rating as f32)))
            })
            .collect();

        debug!(
            "Generated {} collaborative recommendations",
            recommendations.len()
        );
        recommendations
    }
}
