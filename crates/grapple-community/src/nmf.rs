//! Non-negative matrix factorization with multiplicative updates.
//!
//! Lee & Seung, "Algorithms for Non-negative Matrix Factorization" (NIPS 2001).
//!
//! Minimizes `||X - W H||_F²` over `W, H >= 0`:
//!
//! ```text
//! H <- H ⊙ (Wᵀ X) / (Wᵀ W H)
//! W <- W ⊙ (X Hᵀ) / (W H Hᵀ)
//! ```
//!
//! Each update keeps the factors non-negative and never increases the loss.
//! Also hosts the small dense helpers shared by the factorization-based
//! community estimators.

use grapple_core::{Error, Result};
use ndarray::{Array2, Axis, Zip};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_xorshift::XorShiftRng;

/// Guards divisions in multiplicative updates.
pub const EPSILON: f64 = 1e-10;

/// `(rows, cols)` matrix with entries drawn uniformly from `[0, 1)`.
pub fn uniform_matrix<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_simple_fn((rows, cols), || rng.random::<f64>())
}

/// `numerator / max(denominator, floor)`, elementwise, into `target`.
pub fn multiplicative_update(
    target: &mut Array2<f64>,
    numerator: &Array2<f64>,
    denominator: &Array2<f64>,
    floor: f64,
) {
    Zip::from(target)
        .and(numerator)
        .and(denominator)
        .for_each(|t, &n, &d| *t *= n / d.max(floor));
}

/// Scale each row to sum to one; all-zero rows are left alone.
pub fn normalize_rows(matrix: &mut Array2<f64>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let sum = row.sum();
        if sum > 0.0 {
            row /= sum;
        }
    }
}

/// Multiplicative-update NMF.
#[derive(Debug, Clone, Copy)]
pub struct Nmf {
    /// Rank of the factorization.
    pub components: usize,
    pub iterations: usize,
    pub seed: u64,
}

impl Nmf {
    pub fn new(components: usize, iterations: usize, seed: u64) -> Self {
        Self {
            components,
            iterations,
            seed,
        }
    }

    /// Factor `x` (`n x m`, non-negative) into `W` (`n x k`) and `H` (`k x m`).
    ///
    /// Factors start as `|N(0, 1)| * sqrt(mean(x) / k)`.
    pub fn fit(&self, x: &Array2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        if self.components == 0 {
            return Err(Error::InvalidParameter("components must be positive".into()));
        }
        if x.iter().any(|&v| v < 0.0 || !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "NMF input must be finite and non-negative".into(),
            ));
        }
        let (n, m) = x.dim();
        let k = self.components;
        let scale = (x.mean().unwrap_or(0.0) / k as f64).sqrt();

        let mut rng = XorShiftRng::seed_from_u64(self.seed);
        let mut init = |rows: usize, cols: usize| {
            Array2::from_shape_simple_fn((rows, cols), || {
                let z: f64 = StandardNormal.sample(&mut rng);
                z.abs() * scale
            })
        };
        let mut w: Array2<f64> = init(n, k);
        let mut h: Array2<f64> = init(k, m);

        for _ in 0..self.iterations {
            let numerator = w.t().dot(x);
            let denominator = w.t().dot(&w).dot(&h);
            multiplicative_update(&mut h, &numerator, &denominator, EPSILON);

            let numerator = x.dot(&h.t());
            let denominator = w.dot(&h).dot(&h.t());
            multiplicative_update(&mut w, &numerator, &denominator, EPSILON);
        }
        Ok((w, h))
    }
}

/// `||x - w h||_F`.
pub fn reconstruction_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let diff = x - &w.dot(h);
    diff.mapv(|v| v * v).sum().sqrt()
}
