//! Non-negative symmetric encoder-decoder (NNSED).
//!
//! Sun et al., "A Non-negative Symmetric Encoder-Decoder Approach for
//! Community Detection" (CIKM 2017).
//!
//! The adjacency matrix is both decoded from and encoded into a community
//! matrix `Z` through a shared basis `W`:
//!
//! ```text
//! min ||A - W Z||²  +  ||Z - Wᵀ A||²      W, Z >= 0
//!
//! W <- W ⊙ 2 A Zᵀ / (W Z Zᵀ + A Aᵀ W + ε)
//! Z <- Z ⊙ 2 Wᵀ A / (Wᵀ W Z + Z + ε)
//! ```

use crate::nmf::uniform_matrix;
use grapple_core::estimator::fitted;
use grapple_core::{
    CommunityDetection, Error, Estimator, Graph, Memberships, NodeEmbedding, Result,
};
use ndarray::{Array2, Zip};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NnsedConfig {
    /// Number of communities (columns of `W`).
    pub dimensions: usize,
    pub iterations: usize,
    /// Added to every update denominator.
    pub noise: f64,
    pub seed: u64,
}

impl Default for NnsedConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            iterations: 10,
            noise: 1e-6,
            seed: 42,
        }
    }
}

impl NnsedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        if !(self.noise.is_finite() && self.noise > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "noise must be positive, got {}",
                self.noise
            )));
        }
        Ok(())
    }
}

/// `target ⊙ numerator / (denominator + noise)`.
fn update(
    target: &mut Array2<f64>,
    numerator: &Array2<f64>,
    denominator: &Array2<f64>,
    noise: f64,
) {
    Zip::from(target)
        .and(numerator)
        .and(denominator)
        .for_each(|t, &n, &d| *t *= n / (d + noise));
}

/// NNSED community detection.
#[derive(Debug, Clone, Default)]
pub struct Nnsed {
    config: NnsedConfig,
    /// Basis `W` (`n x d`).
    w: Option<Array2<f64>>,
}

impl Nnsed {
    pub fn new(config: NnsedConfig) -> Self {
        Self { config, w: None }
    }

    pub fn config(&self) -> &NnsedConfig {
        &self.config
    }
}

impl Estimator for Nnsed {
    const NAME: &'static str = "NNSED";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let n = graph.node_count();
        let d = self.config.dimensions;
        let noise = self.config.noise;
        let a = graph.adjacency_matrix();
        let a_at = a.dot(&a.t());

        let mut rng = XorShiftRng::seed_from_u64(self.config.seed);
        let mut w = uniform_matrix(n, d, &mut rng);
        let mut z = uniform_matrix(d, n, &mut rng);

        for iteration in 0..self.config.iterations {
            let numerator = a.dot(&z.t()) * 2.0;
            let denominator = w.dot(&z.dot(&z.t())) + a_at.dot(&w);
            update(&mut w, &numerator, &denominator, noise);

            let numerator = w.t().dot(&a) * 2.0;
            let denominator = w.t().dot(&w).dot(&z) + &z;
            update(&mut z, &numerator, &denominator, noise);

            debug!(iteration, "NNSED update");
        }

        info!(nodes = n, dimensions = d, "NNSED fitted");
        self.w = Some(w);
        Ok(())
    }
}

impl NodeEmbedding for Nnsed {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.w, Self::NAME).cloned()
    }
}

impl CommunityDetection for Nnsed {
    fn memberships(&self) -> Result<Memberships> {
        Ok(Memberships::from_argmax(fitted(&self.w, Self::NAME)?))
    }
}
