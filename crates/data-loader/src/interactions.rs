//! Synthetic user-movie interaction matrix.
//!
//! There is no real rating data for the TMDB catalog, so ratings are
//! fabricated from each movie's popularity and vote average plus noise. The
//! random draws happen in a fixed order, and that order is part of the
//! contract: any change moves values to different user/movie pairs.
//!
//! Draw order for a generator `rng`:
//! 1. one Gaussian per movie, in catalog order (base rating noise);
//! 2. for each user in order: the rating count, then the distinct movie
//!    indices, then one Gaussian per chosen movie in the order drawn.
//!
//! Every Gaussian consumes two uniform draws (Box-Muller).

use crate::error::{DataLoadError, Result};
use crate::types::{Catalog, ItemIndex, UserId};
use ndarray::{Array2, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Seed used for reproducible builds
pub const DEFAULT_SEED: u64 = 42;

/// Number of simulated users
pub const DEFAULT_USER_COUNT: usize = 1000;

/// Each user rates between 10 and 50 movies (inclusive)
pub const MIN_RATINGS_PER_USER: usize = 10;
pub const MAX_RATINGS_PER_USER: usize = 50;

const BASE_NOISE_SIGMA: f64 = 0.1;
const USER_NOISE_SIGMA: f64 = 0.2;

/// Dense `users x movies` rating matrix.
///
/// `0` means unrated, `1..=5` is an observed rating. Memory is one byte per
/// cell, so 1000 users over ~4800 movies is about 4.8 MB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRatings")]
pub struct InteractionMatrix {
    ratings: Array2<u8>,
}

/// Serialized shape of [`InteractionMatrix`]; decoding goes through `from_array`
#[derive(Deserialize)]
struct StoredRatings {
    ratings: Array2<u8>,
}

impl TryFrom<StoredRatings> for InteractionMatrix {
    type Error = DataLoadError;

    fn try_from(stored: StoredRatings) -> Result<Self> {
        Self::from_array(stored.ratings)
    }
}

impl InteractionMatrix {
    /// Wrap an existing rating grid, checking every value is in `0..=5`
    pub fn from_array(ratings: Array2<u8>) -> Result<Self> {
        if let Some(bad) = ratings.iter().find(|&&r| r > 5) {
            return Err(DataLoadError::ValidationError(format!(
                "rating {} outside 0..=5",
                bad
            )));
        }
        Ok(Self { ratings })
    }

    pub fn user_count(&self) -> usize {
        self.ratings.nrows()
    }

    pub fn item_count(&self) -> usize {
        self.ratings.ncols()
    }

    /// (users, movies)
    pub fn shape(&self) -> (usize, usize) {
        self.ratings.dim()
    }

    /// Rating row of a user, `None` when the id is out of range
    pub fn user_row(&self, user_id: UserId) -> Option<ArrayView1<'_, u8>> {
        let user = user_id as usize;
        (user < self.user_count()).then(|| self.ratings.row(user))
    }

    pub fn get(&self, user_id: UserId, item: ItemIndex) -> Option<u8> {
        self.ratings.get((user_id as usize, item)).copied()
    }

    /// Number of non-zero cells
    pub fn rated_count(&self) -> usize {
        self.ratings.iter().filter(|&&r| r > 0).count()
    }

    /// Fraction of cells that hold a rating
    pub fn density(&self) -> f64 {
        let cells = self.ratings.len();
        if cells == 0 {
            0.0
        } else {
            self.rated_count() as f64 / cells as f64
        }
    }

    pub fn as_array(&self) -> &Array2<u8> {
        &self.ratings
    }

    /// The matrix as floats, ready for factorization
    pub fn to_f64(&self) -> Array2<f64> {
        self.ratings.mapv(f64::from)
    }
}

/// Standard normal sample via the Box-Muller transform.
///
/// Consumes exactly two uniform draws from `rng`.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 - U keeps u1 in (0, 1] so ln(u1) is finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Popularity/quality prior for every movie, in catalog order.
///
/// `0.6 * min(popularity / 100, 1) + 0.4 * vote_average / 10 + N(0, 0.1)`,
/// clipped to `[0, 1]`.
pub fn base_ratings<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Vec<f64> {
    catalog
        .movies()
        .iter()
        .map(|movie| {
            let popularity = (f64::from(movie.popularity) / 100.0).min(1.0);
            let quality = f64::from(movie.vote_average) / 10.0;
            let base = 0.6 * popularity + 0.4 * quality;
            (base + BASE_NOISE_SIGMA * standard_normal(rng)).clamp(0.0, 1.0)
        })
        .collect()
}

/// Map a `[0, 1]` preference onto the 1-5 star scale
fn to_stars(value: f64) -> u8 {
    // value == 1.0 would land on 6
    ((value * 5.0).floor() as u8 + 1).min(5)
}

/// Generate the synthetic interaction matrix.
///
/// The caller owns the random generator, so the same seeded generator and
/// the same catalog always produce the same matrix.
pub fn generate_interactions<R: Rng + ?Sized>(
    catalog: &Catalog,
    user_count: usize,
    rng: &mut R,
) -> InteractionMatrix {
    let item_count = catalog.len();
    let base = base_ratings(catalog, rng);

    let mut ratings = Array2::<u8>::zeros((user_count, item_count));
    for user in 0..user_count {
        let wanted = rng.random_range(MIN_RATINGS_PER_USER..=MAX_RATINGS_PER_USER);
        let count = wanted.min(item_count);
        let chosen = rand::seq::index::sample(rng, item_count, count);

        for item in chosen.into_iter() {
            let value = (base[item] + USER_NOISE_SIGMA * standard_normal(rng)).clamp(0.0, 1.0);
            ratings[[user, item]] = to_stars(value);
        }
    }

    let matrix = InteractionMatrix { ratings };
    info!(
        "Generated interaction matrix {}x{} ({} ratings, density {:.4})",
        user_count,
        item_count,
        matrix.rated_count(),
        matrix.density()
    );
    matrix
}
