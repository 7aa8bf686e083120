//! Truncated random walks (DeepWalk) and biased second-order walks (node2vec).
//!
//! Implements the walk corpus generation of:
//! - Perozzi et al., "DeepWalk: Online Learning of Social Representations" (KDD 2014)
//! - Grover & Leskovec, "node2vec: Scalable Feature Learning for Networks" (KDD 2016)
//!
//! ## Performance Notes
//!
//! - Neighbor lists are precomputed and sorted once per walker
//! - Biased steps use rejection sampling for O(1) expected time per step
//! - Rounds (one walk per node) run in parallel via rayon, each with its own
//!   seed, so the corpus does not depend on thread scheduling

use crate::{Error, Graph, NodeId, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A single walk: the sequence of visited nodes.
pub type Walk = Vec<NodeId>;

/// Configuration for random walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Maximum length of each walk (including the start node).
    pub walk_length: usize,
    /// Number of walks started from each node.
    pub walk_number: usize,
    /// Return parameter (p): weight `1/p` for stepping back to the previous node.
    pub p: f32,
    /// In-out parameter (q): weight `1/q` for moving away from the previous node.
    pub q: f32,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_length: 80,
            walk_number: 10,
            p: 1.0,
            q: 1.0,
            seed: 42,
        }
    }
}

impl WalkConfig {
    /// Reject degenerate settings.
    pub fn validate(&self) -> Result<()> {
        if self.walk_length == 0 {
            return Err(Error::InvalidParameter("walk_length must be positive".into()));
        }
        if self.walk_number == 0 {
            return Err(Error::InvalidParameter("walk_number must be positive".into()));
        }
        for (name, value) in [("p", self.p), ("q", self.q)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn is_unbiased(&self) -> bool {
        (self.p - 1.0).abs() < f32::EPSILON && (self.q - 1.0).abs() < f32::EPSILON
    }
}

/// Generate walks for every node in the graph.
///
/// Returns `walk_number * node_count` walks.
pub fn generate_walks(graph: &Graph, config: WalkConfig) -> Result<Vec<Walk>> {
    config.validate()?;
    Ok(RandomWalker::new(graph, config).walks())
}

/// Random walker over a [`Graph`].
pub struct RandomWalker {
    adjacency: Vec<Vec<NodeId>>,
    config: WalkConfig,
}

impl RandomWalker {
    /// Create a walker. Neighbor lists are snapshotted here.
    pub fn new(graph: &Graph, config: WalkConfig) -> Self {
        Self {
            adjacency: graph.adjacency_lists(),
            config,
        }
    }

    /// Generate all walks, one round per `walk_number`, rounds in parallel.
    pub fn walks(&self) -> Vec<Walk> {
        let nodes: Vec<NodeId> = (0..self.adjacency.len()).collect();
        let unbiased = self.config.is_unbiased();

        (0..self.config.walk_number)
            .into_par_iter()
            .map(|round| {
                let seed = self.config.seed.wrapping_add(round as u64);
                let mut rng = XorShiftRng::seed_from_u64(seed);
                let mut starts = nodes.clone();
                starts.shuffle(&mut rng);

                starts
                    .into_iter()
                    .map(|start| {
                        if unbiased {
                            self.unbiased_walk(start, &mut rng)
                        } else {
                            self.biased_walk(start, &mut rng)
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// Uniform random walk (DeepWalk), O(1) per step.
    fn unbiased_walk<R: Rng>(&self, start: NodeId, rng: &mut R) -> Walk {
        let mut walk = Vec::with_capacity(self.config.walk_length);
        walk.push(start);

        let mut curr = start;
        for _ in 1..self.config.walk_length {
            let Some(&next) = self.adjacency[curr].choose(rng) else {
                break;
            };
            walk.push(next);
            curr = next;
        }
        walk
    }

    /// Biased second-order walk, O(1) expected per step via rejection sampling.
    fn biased_walk<R: Rng>(&self, start: NodeId, rng: &mut R) -> Walk {
        let mut walk = Vec::with_capacity(self.config.walk_length);
        walk.push(start);

        let mut curr = start;
        let mut prev: Option<NodeId> = None;

        for _ in 1..self.config.walk_length {
            let neighbors = &self.adjacency[curr];
            if neighbors.is_empty() {
                break;
            }

            let next = match prev {
                Some(prev_node) => self.sample_biased(rng, prev_node, neighbors),
                // First step: uniform
                None => neighbors[rng.random_range(0..neighbors.len())],
            };

            walk.push(next);
            prev = Some(curr);
            curr = next;
        }
        walk
    }

    /// Sample the next node; instead of weighting all d neighbors we draw
    /// uniformly and accept with probability `weight / max_weight`.
    fn sample_biased<R: Rng>(&self, rng: &mut R, prev: NodeId, neighbors: &[NodeId]) -> NodeId {
        let p = f64::from(self.config.p);
        let q = f64::from(self.config.q);
        let max_prob = (1.0 / p).max(1.0).max(1.0 / q);
        let prev_neighbors = &self.adjacency[prev];

        loop {
            let candidate = neighbors[rng.random_range(0..neighbors.len())];
            let r: f64 = rng.random();

            let unnorm_prob = if candidate == prev {
                1.0 / p
            } else if prev_neighbors.binary_search(&candidate).is_ok() {
                1.0
            } else {
                1.0 / q
            };

            if r < unnorm_prob / max_prob {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph {
        // 0 - 1 - 2 - 3
        Graph::from_edges([(0, 1), (1, 2), (2, 3)])
    }

    #[test]
    fn test_random_walk_uniform() {
        let g = Graph::from_edges([(0, 1), (1, 2)]);
        let config = WalkConfig {
            walk_length: 10,
            walk_number: 2,
            ..Default::default()
        };

        let walks = generate_walks(&g, config).unwrap();
        assert_eq!(walks.len(), 3 * 2);
        for walk in &walks {
            assert_eq!(walk.len(), 10);
        }
    }

    #[test]
    fn test_random_walk_biased_steps_are_edges() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 20,
            walk_number: 5,
            p: 0.5,
            q: 2.0,
            seed: 123,
        };

        let walks = generate_walks(&g, config).unwrap();
        assert_eq!(walks.len(), 4 * 5);
        for walk in &walks {
            for pair in walk.windows(2) {
                assert!(g.has_edge(pair[0], pair[1]));
            }
        }
    }

    #[test]
    fn test_every_node_starts_walk_number_walks() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 3,
            walk_number: 4,
            ..Default::default()
        };
        let walks = generate_walks(&g, config).unwrap();
        for node in g.nodes() {
            assert_eq!(walks.iter().filter(|w| w[0] == node).count(), 4);
        }
    }

    #[test]
    fn test_isolated_node_walk_stops() {
        let mut g = Graph::from_edges([(0, 1)]);
        g.ensure_nodes(3);
        let walks = generate_walks(&g, WalkConfig::default()).unwrap();
        for walk in walks.iter().filter(|w| w[0] == 2) {
            assert_eq!(walk, &vec![2]);
        }
    }

    #[test]
    fn test_random_walk_reproducible() {
        let g = path_graph();
        let config = WalkConfig {
            walk_length: 10,
            walk_number: 3,
            p: 0.25,
            q: 4.0,
            seed: 999,
        };

        let walks1 = generate_walks(&g, config).unwrap();
        let walks2 = generate_walks(&g, config).unwrap();
        assert_eq!(walks1, walks2);
    }

    #[test]
    fn test_invalid_config() {
        let g = path_graph();
        let bad = WalkConfig {
            p: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            generate_walks(&g, bad),
            Err(Error::InvalidParameter(_))
        ));
    }
}
