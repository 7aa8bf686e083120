//! GraRep: global structural embeddings from k-step transition matrices.
//!
//! Cao, Lu & Xu, "GraRep: Learning Graph Representations with Global
//! Structural Information" (CIKM 2015).
//!
//! For every step `k in 1..=order` the k-step transition matrix `Pᵏ`
//! (`P = D⁻¹A`) becomes a positive log-probability matrix
//!
//! ```text
//! X_k[i, j] = max(0, ln(Pᵏ[i, j] / Γ_j) - ln(1 / n)),    Γ_j = Σ_i Pᵏ[i, j]
//! ```
//!
//! which is factorized by a rank-`dimensions` truncated SVD. The projections
//! `U_k Σ_k` are concatenated, so the output has `dimensions * order` columns.

use grapple_core::estimator::fitted;
use grapple_core::linalg::truncated_svd;
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::{concatenate, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraRepConfig {
    /// Dimension of each per-step block.
    pub dimensions: usize,
    /// Largest transition step (number of blocks).
    pub order: usize,
    /// Power iterations per singular vector.
    pub svd_iterations: usize,
    pub seed: u64,
}

impl Default for GraRepConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            order: 5,
            svd_iterations: 100,
            seed: 42,
        }
    }
}

impl GraRepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        if self.order == 0 {
            return Err(Error::InvalidParameter("order must be positive".into()));
        }
        if self.svd_iterations == 0 {
            return Err(Error::InvalidParameter("svd_iterations must be positive".into()));
        }
        Ok(())
    }
}

/// Positive shifted log of a column-normalized transition power.
pub fn log_probability(power: &Array2<f64>) -> Array2<f64> {
    let n = power.nrows() as f64;
    let column_sums = power.sum_axis(Axis(0));
    let mut x = Array2::zeros(power.dim());
    Zip::indexed(&mut x)
        .and(power)
        .for_each(|(_, j), x, &p| {
            if p > 0.0 && column_sums[j] > 0.0 {
                *x = (p * n / column_sums[j]).ln().max(0.0);
            }
        });
    x
}

/// GraRep node embedding.
#[derive(Debug, Clone, Default)]
pub struct GraRep {
    config: GraRepConfig,
    embedding: Option<Array2<f64>>,
}

impl GraRep {
    pub fn new(config: GraRepConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &GraRepConfig {
        &self.config
    }
}

impl Estimator for GraRep {
    const NAME: &'static str = "GraRep";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let transition = graph.transition_matrix();
        let mut power = transition.clone();
        let mut blocks = Vec::with_capacity(self.config.order);
        for step in 1..=self.config.order {
            if step > 1 {
                power = power.dot(&transition);
            }
            let target = log_probability(&power);
            let svd = truncated_svd(
                &target,
                self.config.dimensions,
                self.config.svd_iterations,
                self.config.seed.wrapping_add(step as u64),
            )?;
            debug!(
                step,
                leading = svd.singular_values[0],
                "transition step factorized"
            );
            blocks.push(svd.projection());
        }

        let views: Vec<_> = blocks.iter().map(Array2::view).collect();
        let embedding = concatenate(Axis(1), &views)
            .map_err(|e| Error::InvalidParameter(format!("concatenating blocks: {e}")))?;
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            order = self.config.order,
            dim = embedding.ncols(),
            "GraRep fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for GraRep {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;
    use ndarray::array;

    fn small() -> GraRepConfig {
        GraRepConfig {
            dimensions: 4,
            order: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_log_probability() {
        // Path 0 - 1 - 2: P has column sums [0.5, 2, 0.5]
        let p = array![[0.0, 1.0, 0.0], [0.5, 0.0, 0.5], [0.0, 1.0, 0.0]];
        let x = log_probability(&p);
        assert!((x[[1, 0]] - 3.0f64.ln()).abs() < 1e-12);
        assert!((x[[0, 1]] - 1.5f64.ln()).abs() < 1e-12);
        assert_eq!(x[[0, 0]], 0.0);
        assert!(x.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_output_width_is_dimensions_times_order() {
        let mut model = GraRep::new(small());
        model.fit(&karate_club()).unwrap();
        let emb = model.embedding().unwrap();
        assert_eq!(emb.dim(), (34, 12));
        assert!(emb.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_deterministic() {
        let g = karate_club();
        let run = || {
            let mut model = GraRep::new(small());
            model.fit(&g).unwrap();
            model.embedding().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_not_fitted() {
        assert!(matches!(
            GraRep::default().embedding(),
            Err(Error::NotFitted("GraRep"))
        ));
    }

    #[test]
    fn test_rejects_rank_above_node_count() {
        let g = Graph::from_edges([(0, 1), (1, 2)]);
        let mut model = GraRep::new(GraRepConfig {
            dimensions: 4,
            ..Default::default()
        });
        assert!(matches!(model.fit(&g), Err(Error::InvalidParameter(_))));
    }
}
