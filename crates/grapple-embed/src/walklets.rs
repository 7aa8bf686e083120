//! Walklets: multi-scale embeddings from skipped random walks.
//!
//! Perozzi et al., "Don't Walk, Skip! Online Learning of Multi-scale Network
//! Embeddings" (ASONAM 2017).
//!
//! For each power `k`, every walk is subsampled to every k-th node (once per
//! starting offset) and a window-1 skip-gram learns the `k`-step relation
//! only. The per-power embeddings are concatenated, so the output has
//! `dimensions * window_size` columns.

use crate::skipgram::{embed_walks, SkipGramConfig};
use grapple_core::estimator::fitted;
use grapple_core::walk::{generate_walks, Walk, WalkConfig};
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkletsConfig {
    pub walk_number: usize,
    pub walk_length: usize,
    /// Dimension of each per-power block.
    pub dimensions: usize,
    /// Largest power (number of blocks).
    pub window_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub min_count: usize,
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for WalkletsConfig {
    fn default() -> Self {
        Self {
            walk_number: 10,
            walk_length: 80,
            dimensions: 32,
            window_size: 4,
            epochs: 1,
            learning_rate: 0.05,
            min_count: 1,
            negative_samples: 5,
            seed: 42,
        }
    }
}

impl WalkletsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidParameter("window_size must be positive".into()));
        }
        self.walk_config().validate()?;
        self.skipgram_config().validate()
    }

    fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            walk_length: self.walk_length,
            walk_number: self.walk_number,
            seed: self.seed,
            ..Default::default()
        }
    }

    fn skipgram_config(&self) -> SkipGramConfig {
        SkipGramConfig {
            embedding_dim: self.dimensions,
            window_size: 1,
            negative_samples: self.negative_samples,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            min_count: self.min_count,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Subsample every walk to every `power`-th node, once per offset `0..=power`.
///
/// Offsets past the end of a walk produce nothing.
pub fn select_walklets(walks: &[Walk], power: usize) -> Vec<Walk> {
    let mut walklets = Vec::with_capacity(walks.len() * (power + 1));
    for walk in walks {
        for offset in 0..=power {
            let walklet: Walk = walk.iter().skip(offset).step_by(power).copied().collect();
            if !walklet.is_empty() {
                walklets.push(walklet);
            }
        }
    }
    walklets
}

/// Walklets node embedding.
#[derive(Debug, Clone, Default)]
pub struct Walklets {
    config: WalkletsConfig,
    embedding: Option<Array2<f64>>,
}

impl Walklets {
    pub fn new(config: WalkletsConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &WalkletsConfig {
        &self.config
    }
}

impl Estimator for Walklets {
    const NAME: &'static str = "Walklets";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let walks = generate_walks(graph, self.config.walk_config())?;
        let mut blocks = Vec::with_capacity(self.config.window_size);
        for power in 1..=self.config.window_size {
            let walklets = select_walklets(&walks, power);
            debug!(power, walklets = walklets.len(), "training walklet block");
            blocks.push(embed_walks(
                &walklets,
                graph.node_count(),
                self.config.skipgram_config(),
            )?);
        }

        let views: Vec<_> = blocks.iter().map(Array2::view).collect();
        let embedding = concatenate(Axis(1), &views)
            .map_err(|e| Error::InvalidParameter(format!("concatenating blocks: {e}")))?;
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            powers = self.config.window_size,
            dim = embedding.ncols(),
            "Walklets fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for Walklets {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    #[test]
    fn test_select_walklets() {
        let walks = vec![vec![0, 1, 2, 3, 4, 5]];
        assert_eq!(
            select_walklets(&walks, 2),
            vec![vec![0, 2, 4], vec![1, 3, 5], vec![2, 4]]
        );
        assert_eq!(select_walklets(&walks, 1), vec![vec![0, 1, 2, 3, 4, 5], vec![1, 2, 3, 4, 5]]);
    }

    #[test]
    fn test_offset_past_end_is_dropped() {
        let walks = vec![vec![7, 8]];
        assert_eq!(select_walklets(&walks, 3), vec![vec![7], vec![8]]);
    }

    #[test]
    fn test_output_width_is_dimensions_times_window() {
        let mut model = Walklets::new(WalkletsConfig {
            walk_number: 3,
            walk_length: 20,
            dimensions: 8,
            window_size: 3,
            ..Default::default()
        });
        model.fit(&karate_club()).unwrap();
        assert_eq!(model.embedding().unwrap().dim(), (34, 24));
    }
}
