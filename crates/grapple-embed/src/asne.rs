//! Attributed social network embedding over node and feature tokens.
//!
//! Liao et al., "Attributed Social Network Embedding" (TKDE 2018).
//!
//! Walklet sequences are built as in [`crate::walklets`], then every node is
//! tripled and the middle copy swapped for one of the node's features, drawn
//! at random:
//!
//! ```text
//! walklet   a        b        c
//! tokens    a f(a) a b f(b) b c f(c) c
//! ```
//!
//! A window-1 skip-gram over these sequences places each node next to both
//! its structural neighbours and its attributes. Only node vectors are
//! returned.

use crate::skipgram::{SkipGramConfig, Word2Vec};
use crate::walklets::select_walklets;
use grapple_core::estimator::fitted;
use grapple_core::walk::{generate_walks, Walk, WalkConfig};
use grapple_core::{
    ensure_rows, AttributedEstimator, Error, FeatureMatrix, Graph, NodeEmbedding, NodeId, Result,
};
use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Vocabulary item: a node or a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Node(NodeId),
    Feature(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsneConfig {
    pub dimensions: usize,
    pub walk_number: usize,
    pub walk_length: usize,
    /// Largest walklet power.
    pub window_size: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub min_count: usize,
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for AsneConfig {
    fn default() -> Self {
        Self {
            dimensions: 128,
            walk_number: 10,
            walk_length: 80,
            window_size: 3,
            epochs: 1,
            learning_rate: 0.05,
            min_count: 1,
            negative_samples: 5,
            seed: 42,
        }
    }
}

impl AsneConfig {
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

/// Interleave feature tokens into a walklet: `a f(a) a b f(b) b ...`.
///
/// Nodes without features keep all three copies as node tokens.
fn attributed_sequence<R: Rng>(
    walklet: &[NodeId],
    features: &[Vec<usize>],
    rng: &mut R,
) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(walklet.len() * 3);
    for &node in walklet {
        let middle = match features[node].choose(rng) {
            Some(&f) => Token::Feature(f),
            None => Token::Node(node),
        };
        tokens.push(Token::Node(node));
        tokens.push(middle);
        tokens.push(Token::Node(node));
    }
    tokens
}

fn build_corpus(
    walks: &[Walk],
    features: &[Vec<usize>],
    window_size: usize,
    seed: u64,
) -> Vec<Vec<Token>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut corpus = Vec::new();
    for power in 1..=window_size {
        for walklet in select_walklets(walks, power) {
            corpus.push(attributed_sequence(&walklet, features, &mut rng));
        }
    }
    corpus
}

/// ASNE node embedding (attributed).
#[derive(Debug, Clone, Default)]
pub struct Asne {
    config: AsneConfig,
    embedding: Option<Array2<f64>>,
}

impl Asne {
    pub fn new(config: AsneConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &AsneConfig {
        &self.config
    }
}

impl AttributedEstimator for Asne {
    const NAME: &'static str = "ASNE";

    fn fit(&mut self, graph: &Graph, features: &FeatureMatrix) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;
        features.check_rows(graph)?;

        let node_features: Vec<Vec<usize>> =
            graph.nodes().map(|n| features.row_features(n)).collect();
        let walks = generate_walks(graph, self.config.walk_config())?;
        let corpus = build_corpus(
            &walks,
            &node_features,
            self.config.window_size,
            self.config.seed,
        );

        let model = Word2Vec::train(&corpus, self.config.skipgram_config())?;
        let embedding = model.embedding_for(graph.nodes().map(Token::Node))?;
        ensure_rows(&embedding, graph.node_count())?;

        info!(
            nodes = graph.node_count(),
            features = features.n_cols(),
            vocab = model.vocabulary().len(),
            "ASNE fitted"
        );
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for Asne {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    #[test]
    fn test_attributed_sequence_layout() {
        let features = vec![vec![5], vec![]];
        let mut rng = StdRng::seed_from_u64(0);
        let seq = attributed_sequence(&[0, 1], &features, &mut rng);
        assert_eq!(
            seq,
            vec![
                Token::Node(0),
                Token::Feature(5),
                Token::Node(0),
                Token::Node(1),
                Token::Node(1),
                Token::Node(1),
            ]
        );
    }

    #[test]
    fn test_feature_token_belongs_to_node() {
        let features = vec![vec![1, 2, 3], vec![9]];
        let walks = vec![vec![0, 1, 0, 1, 0]];
        let corpus = build_corpus(&walks, &features, 2, 3);
        for seq in &corpus {
            for chunk in seq.chunks(3) {
                let Token::Node(node) = chunk[0] else {
                    panic!("outer token must be a node")
                };
                if let Token::Feature(f) = chunk[1] {
                    assert!(features[node].contains(&f));
                }
            }
        }
    }

    #[test]
    fn test_fit_on_karate() {
        let g = karate_club();
        let x = FeatureMatrix::from_triplets(34, 4, (0..34).map(|n| (n, n % 4, 1.0))).unwrap();
        let mut model = Asne::new(AsneConfig {
            dimensions: 16,
            walk_number: 3,
            walk_length: 20,
            ..Default::default()
        });
        model.fit(&g, &x).unwrap();
        assert_eq!(model.embedding().unwrap().dim(), (34, 16));
    }

    #[test]
    fn test_feature_rows_must_match_nodes() {
        let g = karate_club();
        let x = FeatureMatrix::from_triplets(10, 2, [(0, 1, 1.0)]).unwrap();
        let mut model = Asne::default();
        assert!(matches!(
            model.fit(&g, &x),
            Err(Error::DimensionMismatch { expected: 34, got: 10 })
        ));
    }
}
