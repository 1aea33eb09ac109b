//! Truncated SVD of the user x movie rating matrix.
//!
//! ## Algorithm
//! Randomized range finder followed by an exact solve of a small problem:
//! 1. Sample a Gaussian test matrix `Ω` (items x (rank + oversamples))
//! 2. `Q = orth(X Ω)`, refined by power iterations
//!    `Q = orth(X orth(Xᵀ Q))`, re-orthonormalizing at every step
//! 3. `B = Qᵀ X` is small; eigen-decompose `B Bᵀ = U Σ² Uᵀ` with cyclic Jacobi
//! 4. Item factors (components) are `V = Σ⁻¹ Uᵀ B`, top `rank` rows
//!
//! `transform` projects a rating row onto the factors and
//! `inverse_transform` maps factors back to a dense predicted row.

use crate::error::{ModelError, Result};
use data_loader::standard_normal;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const JACOBI_MAX_SWEEPS: usize = 100;
const ZERO_TOLERANCE: f64 = 1e-10;

/// Factorization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdConfig {
    pub rank: usize,
    pub oversamples: usize,
    pub power_iterations: usize,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            rank: 50,
            oversamples: 10,
            power_iterations: 5,
        }
    }
}

impl SvdConfig {
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.oversamples = oversamples;
        self
    }

    pub fn with_power_iterations(mut self, power_iterations: usize) -> Self {
        self.power_iterations = power_iterations;
        self
    }
}

/// Fitted rank-k factorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruncatedSvd {
    /// `rank x items`, orthonormal rows
    components: Array2<f64>,
    singular_values: Vec<f64>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl TruncatedSvd {
    /// Fit on a dense `users x items` matrix
    pub fn fit<R: Rng + ?Sized>(
        matrix: &Array2<f64>,
        config: &SvdConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let (users, items) = matrix.dim();
        if users == 0 || items == 0 {
            return Err(ModelError::EmptyInput(format!(
                "cannot factorize a {}x{} matrix",
                users, items
            )));
        }
        if config.rank == 0 {
            return Err(ModelError::InvalidModel("rank must be positive".to_string()));
        }

        let rank = config.rank.min(users).min(items);
        if rank < config.rank {
            warn!(
                "Requested rank {} exceeds matrix shape {}x{}; using rank {}",
                config.rank, users, items, rank
            );
        }
        let sketch = (rank + config.oversamples).min(users.min(items));

        // Range finder
        let omega = Array2::from_shape_simple_fn((items, sketch), || standard_normal(&mut *rng));
        let mut q = orthonormalize(matrix.dot(&omega));
        for _ in 0..config.power_iterations {
            let z = orthonormalize(matrix.t().dot(&q));
            q = orthonormalize(matrix.dot(&z));
        }

        // Small problem: B = Qᵀ X, eig(B Bᵀ)
        let b = q.t().dot(matrix);
        let gram = b.dot(&b.t());
        let (eigenvalues, eigenvectors) = symmetric_eigen(gram);

        let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
        order.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]).then_with(|| i.cmp(&j)));

        let mut components = Array2::<f64>::zeros((rank, items));
        let mut singular_values = Vec::with_capacity(rank);
        for (k, &idx) in order.iter().take(rank).enumerate() {
            let sigma = eigenvalues[idx].max(0.0).sqrt();
            singular_values.push(sigma);
            if sigma > ZERO_TOLERANCE {
                let u = eigenvectors.column(idx);
                let v = u.dot(&b) / sigma;
                components.row_mut(k).assign(&v);
            }
        }

        // Variance of the projected data relative to the column variance of X
        let projected = matrix.dot(&components.t());
        let explained_variance: Vec<f64> = projected
            .axis_iter(Axis(1))
            .map(population_variance)
            .collect();
        let total_variance: f64 = matrix.axis_iter(Axis(1)).map(population_variance).sum();
        let explained_variance_ratio: Vec<f64> = explained_variance
            .iter()
            .map(|&v| if total_variance > 0.0 { v / total_variance } else { 0.0 })
            .collect();

        let model = Self {
            components,
            singular_values,
            explained_variance,
            explained_variance_ratio,
        };
        info!(
            "Fitted truncated SVD: rank {} over {}x{} (explained variance {:.4})",
            rank,
            users,
            items,
            model.total_explained_variance_ratio()
        );
        Ok(model)
    }

    pub fn rank(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.components.ncols()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    pub fn total_explained_variance_ratio(&self) -> f64 {
        self.explained_variance_ratio.iter().sum()
    }

    /// Project one rating row (length `items`) onto the latent factors
    pub fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if row.len() != self.n_items() {
            return Err(ModelError::DimensionMismatch {
                what: "rating row".to_string(),
                expected: self.n_items(),
                found: row.len(),
            });
        }
        Ok(self.components.dot(&row))
    }

    /// Map latent factors (length `rank`) back to a dense item row
    pub fn inverse_transform(&self, factors: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if factors.len() != self.rank() {
            return Err(ModelError::DimensionMismatch {
                what: "latent factors".to_string(),
                expected: self.rank(),
                found: factors.len(),
            });
        }
        Ok(self.components.t().dot(&factors))
    }

    /// `inverse_transform(transform(row))`
    pub fn reconstruct(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        let factors = self.transform(row)?;
        self.inverse_transform(factors.view())
    }

    /// Structural checks for a deserialized model
    pub fn validate(&self) -> Result<()> {
        for (what, len) in [
            ("singular values", self.singular_values.len()),
            ("explained variance", self.explained_variance.len()),
            ("explained variance ratio", self.explained_variance_ratio.len()),
        ] {
            if len != self.rank() {
                return Err(ModelError::DimensionMismatch {
                    what: what.to_string(),
                    expected: self.rank(),
                    found: len,
                });
            }
        }
        if self.components.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidModel(
                "non-finite value in components".to_string(),
            ));
        }
        Ok(())
    }
}

fn population_variance(values: ArrayView1<'_, f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mean = values.sum() / n as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64
}

/// Orthonormalize the columns of `m` with modified Gram-Schmidt.
///
/// Each column is projected out twice against the previous ones. Columns
/// that collapse to zero (rank deficiency) stay zero.
pub fn orthonormalize(mut m: Array2<f64>) -> Array2<f64> {
    for j in 0..m.ncols() {
        for _ in 0..2 {
            for i in 0..j {
                let basis = m.column(i).to_owned();
                let proj = basis.dot(&m.column(j));
                m.column_mut(j).scaled_add(-proj, &basis);
            }
        }
        let norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm > ZERO_TOLERANCE {
            m.column_mut(j).mapv_inplace(|x| x / norm);
        } else {
            m.column_mut(j).fill(0.0);
        }
    }
    m
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix, by
/// cyclic Jacobi rotations
pub fn symmetric_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);
    for sweep in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off <= 1e-24 * scale {
            debug!("Jacobi converged after {} sweeps", sweep);
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn create_test_matrix() -> Array2<f64> {
        array![
            [5.0, 0.0, 3.0, 0.0],
            [4.0, 1.0, 0.0, 2.0],
            [0.0, 5.0, 4.0, 0.0],
            [1.0, 0.0, 0.0, 5.0],
            [3.0, 3.0, 3.0, 3.0],
            [0.0, 2.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn test_symmetric_eigen_diagonalizes() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let (values, vectors) = symmetric_eigen(a.clone());

        for (k, &lambda) in values.iter().enumerate() {
            let v = vectors.column(k);
            let av = a.dot(&v);
            for i in 0..3 {
                assert!((av[i] - lambda * v[i]).abs() < 1e-9);
            }
        }
        let trace: f64 = values.iter().sum();
        assert!((trace - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthonormalize() {
        let m = array![[1.0, 1.0, 2.0], [0.0, 1.0, 2.0], [1.0, 0.0, 2.0], [0.0, 0.0, 0.0]];
        let q = orthonormalize(m);
        let gram = q.t().dot(&q);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_orthonormalize_keeps_dependent_column_zero() {
        let m = array![[1.0, 2.0], [1.0, 2.0]];
        let q = orthonormalize(m);
        assert!(q.column(1).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_full_rank_reconstruction_is_exact() {
        let matrix = create_test_matrix();
        let mut rng = StdRng::seed_from_u64(42);
        let svd = TruncatedSvd::fit(&matrix, &SvdConfig::default(), &mut rng).unwrap();

        // Rank clamped to the item count
        assert_eq!(svd.rank(), 4);
        assert_eq!(svd.n_items(), 4);

        for row in matrix.rows() {
            let restored = svd.reconstruct(row).unwrap();
            for (a, b) in row.iter().zip(restored.iter()) {
                assert!((a - b).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_singular_values_descending_and_components_orthonormal() {
        let matrix = create_test_matrix();
        let mut rng = StdRng::seed_from_u64(7);
        let config = SvdConfig::default().with_rank(2);
        let svd = TruncatedSvd::fit(&matrix, &config, &mut rng).unwrap();

        assert_eq!(svd.rank(), 2);
        assert!(svd.singular_values()[0] >= svd.singular_values()[1]);

        let gram = svd.components().dot(&svd.components().t());
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-9);
        assert!((gram[[1, 1]] - 1.0).abs() < 1e-9);
        assert!(gram[[0, 1]].abs() < 1e-9);

        let ratio = svd.total_explained_variance_ratio();
        assert!(ratio > 0.0 && ratio <= 1.0 + 1e-9);
        assert!(svd.validate().is_ok());
    }

    #[test]
    fn test_same_seed_same_model() {
        let matrix = create_test_matrix();
        let config = SvdConfig::default().with_rank(2);
        let a = TruncatedSvd::fit(&matrix, &config, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = TruncatedSvd::fit(&matrix, &config, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dimension_checks() {
        let matrix = create_test_matrix();
        let mut rng = StdRng::seed_from_u64(42);
        let svd = TruncatedSvd::fit(&matrix, &SvdConfig::default().with_rank(2), &mut rng).unwrap();

        let short = array![1.0, 2.0];
        assert!(matches!(
            svd.transform(short.view()),
            Err(ModelError::DimensionMismatch { expected: 4, found: 2, .. })
        ));
        let long = array![1.0, 2.0, 3.0];
        assert!(svd.inverse_transform(long.view()).is_err());
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        let empty = Array2::<f64>::zeros((0, 3));
        let mut rng = StdRng::seed_from_u64(42);
        assert!(TruncatedSvd::fit(&empty, &SvdConfig::default(), &mut rng).is_err());
    }
}
