//! DeepWalk: truncated uniform random walks fed to skip-gram.
//!
//! Perozzi et al., "DeepWalk: Online Learning of Social Representations" (KDD 2014).
//!
//! Walks are sentences, nodes are words. Nodes that co-occur within a short
//! window along many walks end up with nearby vectors.

use crate::skipgram::{embed_walks, SkipGramConfig};
use grapple_core::estimator::fitted;
use grapple_core::walk::{generate_walks, WalkConfig};
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// DeepWalk hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepWalkConfig {
    /// Walks started from each node.
    pub walk_number: usize,
    /// Nodes per walk.
    pub walk_length: usize,
    /// Embedding dimension.
    pub dimensions: usize,
    /// Skip-gram context window.
    pub window_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    /// Minimal node occurrences across the walks.
    pub min_count: usize,
    /// Negative samples per positive pair.
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for DeepWalkConfig {
    fn default() -> Self {
        Self {
            walk_number: 10,
            walk_length: 80,
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

impl DeepWalkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(Error::InvalidParameter("dimensions must be positive".into()));
        }
        self.walk_config().validate()?;
        self.skipgram_config().validate()
    }

    pub(crate) fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            walk_length: self.walk_length,
            walk_number: self.walk_number,
            p: 1.0,
            q: 1.0,
            seed: self.seed,
        }
    }

    pub(crate) fn skipgram_config(&self) -> SkipGramConfig {
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

/// DeepWalk node embedding.
#[derive(Debug, Clone, Default)]
pub struct DeepWalk {
    config: DeepWalkConfig,
    embedding: Option<Array2<f64>>,
}

impl DeepWalk {
    pub fn new(config: DeepWalkConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &DeepWalkConfig {
        &self.config
    }
}

impl Estimator for DeepWalk {
    const NAME: &'static str = "DeepWalk";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let walks = generate_walks(graph, self.config.walk_config())?;
        let embedding = embed_walks(&walks, graph.node_count(), self.config.skipgram_config())?;
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            walks = walks.len(),
            dim = embedding.ncols(),
            "DeepWalk fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for DeepWalk {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    fn small() -> DeepWalkConfig {
        DeepWalkConfig {
            walk_number: 5,
            walk_length: 20,
            dimensions: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_embedding_shape() {
        let g = karate_club();
        let mut model = DeepWalk::new(small());
        model.fit(&g).unwrap();
        let emb = model.embedding().unwrap();
        assert_eq!(emb.dim(), (34, 16));
        assert!(emb.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_not_fitted() {
        let model = DeepWalk::default();
        assert!(matches!(model.embedding(), Err(Error::NotFitted("DeepWalk"))));
    }

    #[test]
    fn test_same_seed_same_embedding() {
        let g = karate_club();
        let mut a = DeepWalk::new(small());
        let mut b = DeepWalk::new(small());
        a.fit(&g).unwrap();
        b.fit(&g).unwrap();
        assert_eq!(a.embedding().unwrap(), b.embedding().unwrap());
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let mut model = DeepWalk::new(DeepWalkConfig {
            dimensions: 0,
            ..small()
        });
        assert!(matches!(
            model.fit(&karate_club()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_isolated_node_still_embedded() {
        let mut g = Graph::from_edges([(0, 1), (1, 2), (2, 0)]);
        g.ensure_nodes(4);
        let mut model = DeepWalk::new(small());
        model.fit(&g).unwrap();
        assert_eq!(model.embedding().unwrap().nrows(), 4);
    }

    #[test]
    fn test_partial_json_config() {
        let config: DeepWalkConfig = serde_json::from_str(r#"{"dimensions": 8}"#).unwrap();
        assert_eq!(config.dimensions, 8);
        assert_eq!(config.walk_length, 80);
    }
}
