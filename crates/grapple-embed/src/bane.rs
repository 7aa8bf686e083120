//! BANE: binarized attributed network embedding.
//!
//! Yang et al., "Binarized Attributed Network Embedding" (ICDM 2018).
//!
//! Node features are smoothed over one transition step and reduced by a
//! truncated SVD to `M = svd(P X)` with `dimensions` columns. BANE then
//! looks for a binary code `B ∈ {-1, +1}^(n × d)` and a real matrix `G`
//! minimizing
//!
//! ```text
//! ‖M - B G‖² + α ‖G‖²
//! ```
//!
//! by alternating two steps:
//!
//! 1. `G = (BᵀB + αI)⁻¹ BᵀM`, the ridge solution for fixed `B`.
//! 2. For fixed `G`, cyclic coordinate descent over the columns of `B`:
//!    `B[:, d] = sign(Q[d, :] - Σ_{s≠d} H[s, d] B[:, s])` with `Q = G Mᵀ`
//!    and `H = G Gᵀ`.
//!
//! The embedding is `B` itself, stored as `±1.0`.

use grapple_core::estimator::fitted;
use grapple_core::linalg::{solve_spd, truncated_svd};
use grapple_core::{
    ensure_rows, AttributedEstimator, Error, FeatureMatrix, Graph, NodeEmbedding, Result,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaneConfig {
    /// Code length; also the rank of the feature reduction.
    pub dimensions: usize,
    /// Power iterations per singular vector.
    pub svd_iterations: usize,
    /// Ridge penalty on `G`.
    pub alpha: f64,
    /// Outer alternations.
    pub iterations: usize,
    /// Coordinate sweeps over `B` per alternation.
    pub binarization_iterations: usize,
    pub seed: u64,
}

impl Default for BaneConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            svd_iterations: 100,
            alpha: 0.3,
            iterations: 100,
            binarization_iterations: 20,
            seed: 42,
        }
    }
}

impl BaneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(Error::InvalidParameter("alpha must be positive".into()));
        }
        if self.iterations == 0 || self.binarization_iterations == 0 || self.svd_iterations == 0 {
            return Err(Error::InvalidParameter("iteration counts must be positive".into()));
        }
        Ok(())
    }
}

fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Binarized attributed network embedding.
#[derive(Debug, Clone, Default)]
pub struct Bane {
    config: BaneConfig,
    embedding: Option<Array2<f64>>,
}

impl Bane {
    pub fn new(config: BaneConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &BaneConfig {
        &self.config
    }

    /// One round of coordinate descent over the columns of `codes`.
    fn binarize(codes: &mut Array2<f64>, q: &Array2<f64>, h: &Array2<f64>) {
        let dims = codes.ncols();
        for d in 0..dims {
            let mut target: Array1<f64> = q.row(d).to_owned();
            for s in (0..dims).filter(|&s| s != d) {
                target.scaled_add(-h[[s, d]], &codes.column(s));
            }
            codes.column_mut(d).assign(&target.mapv(sign));
        }
    }
}

impl AttributedEstimator for Bane {
    const NAME: &'static str = "BANE";

    fn fit(&mut self, graph: &Graph, features: &FeatureMatrix) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;
        features.check_rows(graph)?;

        let dims = self.config.dimensions;
        if features.n_cols() < dims {
            return Err(Error::InvalidParameter(format!(
                "{} feature columns cannot be reduced to {dims} dimensions",
                features.n_cols()
            )));
        }

        let smoothed = graph.transition_matrix().dot(&features.to_dense());
        let reduced =
            truncated_svd(&smoothed, dims, self.config.svd_iterations, self.config.seed)?
                .projection();

        let n = graph.node_count();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut codes =
            Array2::from_shape_fn((n, dims), |_| sign(rng.sample::<f64, _>(StandardNormal)));
        let ridge = Array2::<f64>::eye(dims) * self.config.alpha;

        for iteration in 0..self.config.iterations {
            let g = solve_spd(&(codes.t().dot(&codes) + &ridge), &codes.t().dot(&reduced))?;
            let q = g.dot(&reduced.t());
            let h = g.dot(&g.t());
            for _ in 0..self.config.binarization_iterations {
                Self::binarize(&mut codes, &q, &h);
            }
            if iteration % 10 == 0 {
                let residual = &reduced - &codes.dot(&g);
                debug!(
                    iteration,
                    loss = residual.iter().map(|x| x * x).sum::<f64>(),
                    "binary codes updated"
                );
            }
        }
        ensure_rows(&codes, n)?;

        info!(nodes = n, dim = dims, "BANE fitted");
        self.embedding = Some(codes);
        Ok(())
    }
}

impl NodeEmbedding for Bane {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    /// Eight feature columns; node `u` carries columns `u % 8` and `(u + 3) % 8`.
    fn features(n: usize) -> FeatureMatrix {
        FeatureMatrix::from_triplets(
            n,
            8,
            (0..n).flat_map(|u| [(u, u % 8, 1.0), (u, (u + 3) % 8, 1.0)]),
        )
        .unwrap()
    }

    fn small() -> BaneConfig {
        BaneConfig {
            dimensions: 4,
            iterations: 10,
            binarization_iterations: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_codes_are_binary() {
        let g = karate_club();
        let mut model = Bane::new(small());
        model.fit(&g, &features(34)).unwrap();
        let emb = model.embedding().unwrap();
        assert_eq!(emb.dim(), (34, 4));
        assert!(emb.iter().all(|&x| x == 1.0 || x == -1.0));
    }

    #[test]
    fn test_deterministic() {
        let g = karate_club();
        let x = features(34);
        let run = || {
            let mut model = Bane::new(small());
            model.fit(&g, &x).unwrap();
            model.embedding().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_binarize_follows_target_sign() {
        // With H = 0 each column copies the sign of the matching row of Q
        let mut codes = Array2::from_elem((3, 2), 1.0);
        let q = ndarray::array![[0.5, -2.0, 0.0], [-1.0, 1.0, -0.1]];
        Bane::binarize(&mut codes, &q, &Array2::zeros((2, 2)));
        assert_eq!(codes, ndarray::array![[1.0, -1.0], [-1.0, 1.0], [1.0, -1.0]]);
    }

    #[test]
    fn test_not_fitted() {
        assert!(matches!(
            Bane::default().embedding(),
            Err(Error::NotFitted("BANE"))
        ));
    }

    #[test]
    fn test_feature_rows_must_match() {
        let mut model = Bane::new(small());
        let err = model.fit(&karate_club(), &features(10)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_too_few_feature_columns() {
        let mut model = Bane::new(BaneConfig {
            dimensions: 16,
            ..small()
        });
        let err = model.fit(&karate_club(), &features(34)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }
}
