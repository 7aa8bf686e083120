//! Node2Vec: biased second-order random walks fed to skip-gram.
//!
//! Grover & Leskovec, "node2vec: Scalable Feature Learning for Networks" (KDD 2016).
//!
//! # Walk bias
//!
//! From `curr` (arrived from `prev`), a neighbor `next` is weighted:
//!
//! | relation | weight |
//! |----------|--------|
//! | `next == prev` | `1/p` |
//! | `next` adjacent to `prev` | `1` |
//! | otherwise | `1/q` |
//!
//! Low `q` pushes walks outward (DFS-like, homophily); low `p` keeps them
//! local (BFS-like, structural roles). `p = q = 1` is DeepWalk.

use crate::skipgram::{embed_walks, SkipGramConfig};
use grapple_core::estimator::fitted;
use grapple_core::walk::{generate_walks, WalkConfig};
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Node2Vec hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node2VecConfig {
    pub walk_number: usize,
    pub walk_length: usize,
    /// Return parameter.
    pub p: f32,
    /// In-out parameter.
    pub q: f32,
    pub dimensions: usize,
    pub window_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub min_count: usize,
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for Node2VecConfig {
    fn default() -> Self {
        Self {
            walk_number: 10,
            walk_length: 80,
            p: 1.0,
            q: 1.0,
            dimensions: 128,
            window_size: 5,
            epochs: 1,
            learning_rate: 0.05,
            min_count: 1,
            negative_samples: 5,
            seed: 42,
        }
    }
}

impl Node2VecConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        self.walk_config().validate()?;
        self.skipgram_config().validate()
    }

    fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            walk_length: self.walk_length,
            walk_number: self.walk_number,
            p: self.p,
            q: self.q,
            seed: self.seed,
        }
    }

    fn skipgram_config(&self) -> SkipGramConfig {
        SkipGramConfig {
            embedding_dim: self.dimensions,
            window_size: self.window_size,
            negative_samples: self.negative_samples,
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            min_count: self.min_count,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Node2Vec node embedding.
#[derive(Debug, Clone, Default)]
pub struct Node2Vec {
    config: Node2VecConfig,
    embedding: Option<Array2<f64>>,
}

impl Node2Vec {
    pub fn new(config: Node2VecConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &Node2VecConfig {
        &self.config
    }
}

impl Estimator for Node2Vec {
    const NAME: &'static str = "Node2Vec";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let walks = generate_walks(graph, self.config.walk_config())?;
        let embedding = embed_walks(&walks, graph.node_count(), self.config.skipgram_config())?;
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            walks = walks.len(),
            p = self.config.p,
            q = self.config.q,
            "Node2Vec fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for Node2Vec {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::newman_watts_strogatz;

    #[test]
    fn test_biased_embedding_shape() {
        let g = newman_watts_strogatz(60, 4, 0.05, 7).unwrap();
        let mut model = Node2Vec::new(Node2VecConfig {
            walk_number: 3,
            walk_length: 15,
            dimensions: 12,
            p: 0.5,
            q: 2.0,
            ..Default::default()
        });
        model.fit(&g).unwrap();
        assert_eq!(model.embedding().unwrap().dim(), (60, 12));
    }

    #[test]
    fn test_rejects_non_positive_q() {
        let config = Node2VecConfig {
            q: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_graph() {
        let mut model = Node2Vec::default();
        assert!(matches!(
            model.fit(&Graph::new()),
            Err(Error::InvalidGraph(_))
        ));
    }
}
