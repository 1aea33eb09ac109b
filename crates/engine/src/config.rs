//! Build configuration for the recommendation engine.

use data_loader::{DEFAULT_SEED, DEFAULT_USER_COUNT};
use sources::{SvdConfig, TfidfVectorizer};

/// Everything that shapes a trained engine.
///
/// Two builds from the same catalog and the same config are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Seeds both the synthetic ratings and the SVD range finder
    pub seed: u64,
    /// Number of simulated users
    pub user_count: usize,
    pub max_features: usize,
    pub min_df: usize,
    pub ngram_range: (usize, usize),
    pub svd: SvdConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            user_count: DEFAULT_USER_COUNT,
            max_features: 5000,
            min_df: 2,
            ngram_range: (1, 2),
            svd: SvdConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the random seed (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configure the number of simulated users (default: 1000)
    pub fn with_user_count(mut self, user_count: usize) -> Self {
        self.user_count = user_count;
        self
    }

    /// Configure the SVD rank (default: 50)
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.svd = self.svd.with_rank(rank);
        self
    }

    /// Configure the range finder's extra columns (default: 10)
    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.svd = self.svd.with_oversamples(oversamples);
        self
    }

    /// Configure the range finder's power iterations (default: 5)
    pub fn with_power_iterations(mut self, power_iterations: usize) -> Self {
        self.svd = self.svd.with_power_iterations(power_iterations);
        self
    }

    /// Configure the TF-IDF vocabulary cap (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Configure the TF-IDF minimum document frequency (default: 2)
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// The vectorizer these settings describe
    pub fn vectorizer(&self) -> TfidfVectorizer {
        TfidfVectorizer::new()
            .with_max_features(self.max_features)
            .with_min_df(self.min_df)
            .with_ngram_range(self.ngram_range.0, self.ngram_range.1)
    }
}
