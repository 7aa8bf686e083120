//! NetMF: DeepWalk as explicit matrix factorization.
//!
//! Qiu et al., "Network Embedding as Matrix Factorization: Unifying
//! DeepWalk, LINE, PTE, and node2vec" (WSDM 2018), small-window variant.
//!
//! The matrix DeepWalk implicitly factorizes with window `T` and `b`
//! negative samples is
//!
//! ```text
//! M = vol(G) / (b T) · (Σ_{r=1..T} Pʳ) · D⁻¹
//! ```
//!
//! NetMF builds it densely, takes `ln(max(M, 1))` and keeps the rank
//! `dimensions` SVD projection.

use grapple_core::estimator::fitted;
use grapple_core::linalg::truncated_svd;
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetMFConfig {
    pub dimensions: usize,
    /// Window size `T`: number of transition powers summed.
    pub order: usize,
    pub negative_samples: usize,
    /// Power iterations per singular vector.
    pub svd_iterations: usize,
    pub seed: u64,
}

impl Default for NetMFConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            order: 2,
            negative_samples: 1,
            svd_iterations: 100,
            seed: 42,
        }
    }
}

impl NetMFConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        if self.order == 0 {
            return Err(Error::InvalidParameter("order must be positive".into()));
        }
        if self.negative_samples == 0 {
            return Err(Error::InvalidParameter(
                "negative_samples must be positive".into(),
            ));
        }
        if self.svd_iterations == 0 {
            return Err(Error::InvalidParameter("svd_iterations must be positive".into()));
        }
        Ok(())
    }
}

/// `ln(max(M, 1))` for the DeepWalk matrix of `graph`.
pub fn deepwalk_matrix(graph: &Graph, order: usize, negative_samples: usize) -> Array2<f64> {
    let n = graph.node_count();
    let transition = graph.transition_matrix();
    let degrees = graph.adjacency_matrix().sum_axis(Axis(1));
    let volume = degrees.sum();

    let mut power = transition.clone();
    let mut window = transition.clone();
    for _ in 1..order {
        power = power.dot(&transition);
        window += &power;
    }

    let scale = volume / (negative_samples as f64 * order as f64);
    let mut target = Array2::zeros((n, n));
    for ((i, j), &w) in window.indexed_iter() {
        if degrees[j] > 0.0 {
            target[[i, j]] = (scale * w / degrees[j]).max(1.0).ln();
        }
    }
    target
}

/// NetMF node embedding.
#[derive(Debug, Clone, Default)]
pub struct NetMF {
    config: NetMFConfig,
    embedding: Option<Array2<f64>>,
}

impl NetMF {
    pub fn new(config: NetMFConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &NetMFConfig {
        &self.config
    }
}

impl Estimator for NetMF {
    const NAME: &'static str = "NetMF";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let target = deepwalk_matrix(graph, self.config.order, self.config.negative_samples);
        debug!(
            nonzero = target.iter().filter(|&&x| x > 0.0).count(),
            "target matrix built"
        );
        let svd = truncated_svd(
            &target,
            self.config.dimensions,
            self.config.svd_iterations,
            self.config.seed,
        )?;
        let embedding = svd.projection();
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            dim = self.config.dimensions,
            "NetMF fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for NetMF {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}
