//! Louvain modularity optimisation.
//!
//! Blondel et al., "Fast unfolding of communities in large networks" (2008).
//!
//! Two phases repeat until modularity stops improving:
//!
//! 1. **Local moves**: each node (in seeded random order) moves to the
//!    neighbouring community with the largest modularity gain, until a full
//!    pass changes nothing or improves modularity by less than `1e-7`.
//! 2. **Aggregation**: communities collapse into single nodes; intra-community
//!    weight becomes a self-loop.
//!
//! Used directly by [`Louvain`] and as the final clustering step of
//! [`crate::EgoNetSplitter`] and [`crate::EdMot`].

use grapple_core::estimator::fitted;
use grapple_core::{CommunityDetection, Error, Estimator, Graph, Memberships, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Smallest modularity improvement that counts as progress.
const MIN_GAIN: f64 = 1e-7;

/// Weighted graph level: off-diagonal adjacency plus self-loop weights.
struct Level {
    adjacency: Vec<Vec<(usize, f64)>>,
    loops: Vec<f64>,
    /// Weighted degree, self-loops counted twice.
    degree: Vec<f64>,
    /// Total edge weight `m`.
    total: f64,
}

impl Level {
    fn from_graph(graph: &Graph) -> Self {
        Self::from_edges(graph.node_count(), graph.edges())
    }

    fn from_edges<I: IntoIterator<Item = (usize, usize, f64)>>(n: usize, edges: I) -> Self {
        let mut merged: HashMap<(usize, usize), f64> = HashMap::new();
        let mut loops = vec![0.0; n];
        for (u, v, w) in edges {
            if u == v {
                loops[u] += w;
            } else {
                *merged.entry((u.min(v), u.max(v))).or_default() += w;
            }
        }

        let mut adjacency = vec![Vec::new(); n];
        let mut keys: Vec<_> = merged.into_iter().collect();
        keys.sort_by_key(|&(k, _)| k);
        for ((u, v), w) in keys {
            adjacency[u].push((v, w));
            adjacency[v].push((u, w));
        }

        let degree: Vec<f64> = (0..n)
            .map(|u| adjacency[u].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * loops[u])
            .collect();
        let total = degree.iter().sum::<f64>() / 2.0;

        Self {
            adjacency,
            loops,
            degree,
            total,
        }
    }

    fn len(&self) -> usize {
        self.loops.len()
    }

    /// Collapse nodes into their (dense) communities.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut edges = Vec::new();
        for u in 0..self.len() {
            if self.loops[u] > 0.0 {
                edges.push((community[u], community[u], self.loops[u]));
            }
            for &(v, w) in &self.adjacency[u] {
                if u < v {
                    edges.push((community[u], community[v], w));
                }
            }
        }
        Self::from_edges(count, edges)
    }
}

/// Community bookkeeping for the local-move phase.
struct Status {
    node_to_com: Vec<usize>,
    /// Total degree per community.
    degrees: Vec<f64>,
    /// Internal weight per community.
    internals: Vec<f64>,
}

impl Status {
    fn singletons(level: &Level) -> Self {
        Self {
            node_to_com: (0..level.len()).collect(),
            degrees: level.degree.clone(),
            internals: level.loops.clone(),
        }
    }

    fn modularity(&self, level: &Level, resolution: f64) -> f64 {
        let m = level.total;
        self.degrees
            .iter()
            .zip(&self.internals)
            .filter(|&(&d, _)| d > 0.0)
            .map(|(&d, &inner)| inner / m - resolution * (d / (2.0 * m)).powi(2))
            .sum()
    }

    fn remove(&mut self, level: &Level, node: usize, com: usize, links: f64) {
        self.degrees[com] -= level.degree[node];
        self.internals[com] -= links + level.loops[node];
    }

    fn insert(&mut self, level: &Level, node: usize, com: usize, links: f64) {
        self.node_to_com[node] = com;
        self.degrees[com] += level.degree[node];
        self.internals[com] += links + level.loops[node];
    }

    /// Weight from `node` to each neighbouring community.
    fn neighbour_weights(&self, level: &Level, node: usize) -> BTreeMap<usize, f64> {
        let mut weights = BTreeMap::new();
        for &(v, w) in &level.adjacency[node] {
            *weights.entry(self.node_to_com[v]).or_default() += w;
        }
        weights
    }
}

/// Repeated local-move passes on one level.
fn one_level<R: Rng>(level: &Level, status: &mut Status, resolution: f64, rng: &mut R) {
    let m = level.total;
    let mut order: Vec<usize> = (0..level.len()).collect();
    let mut current = status.modularity(level, resolution);

    loop {
        let mut modified = false;
        order.shuffle(rng);

        for &node in &order {
            let com = status.node_to_com[node];
            let degc_totw = level.degree[node] / (2.0 * m);
            let weights = status.neighbour_weights(level, node);
            let own = weights.get(&com).copied().unwrap_or(0.0);

            let remove_cost =
                -own + resolution * (status.degrees[com] - level.degree[node]) * degc_totw;
            status.remove(level, node, com, own);

            let mut best = com;
            let mut best_increase = 0.0;
            for (&candidate, &dnc) in &weights {
                let increase =
                    remove_cost + dnc - resolution * status.degrees[candidate] * degc_totw;
                if increase > best_increase {
                    best_increase = increase;
                    best = candidate;
                }
            }

            let links = weights.get(&best).copied().unwrap_or(0.0);
            status.insert(level, node, best, links);
            if best != com {
                modified = true;
            }
        }

        let updated = status.modularity(level, resolution);
        if !modified || updated - current < MIN_GAIN {
            break;
        }
        current = updated;
    }
}

/// Renumber labels densely in order of first appearance.
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let dense = labels
        .iter()
        .map(|&l| {
            let next = mapping.len();
            *mapping.entry(l).or_insert(next)
        })
        .collect();
    (dense, mapping.len())
}

/// Partition `graph` by multi-level Louvain; labels are dense `0..k`.
///
/// A graph without edges returns one community per node.
pub fn best_partition(graph: &Graph, resolution: f64, seed: u64) -> Result<Vec<usize>> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "resolution must be positive, got {resolution}"
        )));
    }
    let mut level = Level::from_graph(graph);
    if level.total == 0.0 {
        return Ok((0..graph.node_count()).collect());
    }

    let mut rng = XorShiftRng::seed_from_u64(seed);
    let mut partition: Vec<usize> = (0..graph.node_count()).collect();
    let mut best_modularity = f64::NEG_INFINITY;
    let mut depth = 0;

    loop {
        let mut status = Status::singletons(&level);
        one_level(&level, &mut status, resolution, &mut rng);
        let modularity = status.modularity(&level, resolution);

        if depth > 0 && modularity - best_modularity < MIN_GAIN {
            break;
        }
        let (community, count) = renumber(&status.node_to_com);
        for label in &mut partition {
            *label = community[*label];
        }
        debug!(depth, communities = count, modularity, "Louvain level");

        best_modularity = modularity;
        depth += 1;
        if count == level.len() {
            break;
        }
        level = level.aggregate(&community, count);
    }

    Ok(renumber(&partition).0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LouvainConfig {
    /// Modularity resolution; larger values favour smaller communities.
    pub resolution: f64,
    pub seed: u64,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            seed: 42,
        }
    }
}

impl LouvainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        Ok(())
    }
}

/// Louvain community detection (non-overlapping).
#[derive(Debug, Clone, Default)]
pub struct Louvain {
    config: LouvainConfig,
    labels: Option<Vec<usize>>,
}

impl Louvain {
    pub fn new(config: LouvainConfig) -> Self {
        Self {
            config,
            labels: None,
        }
    }

    pub fn config(&self) -> &LouvainConfig {
        &self.config
    }
}

impl Estimator for Louvain {
    const NAME: &'static str = "Louvain";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;
        let labels = best_partition(graph, self.config.resolution, self.config.seed)?;
        info!(
            nodes = graph.node_count(),
            communities = labels.iter().max().map_or(0, |m| m + 1),
            "Louvain fitted"
        );
        self.labels = Some(labels);
        Ok(())
    }
}

impl CommunityDetection for Louvain {
    fn memberships(&self) -> Result<Memberships> {
        let labels = fitted(&self.labels, Self::NAME)?;
        Ok(Memberships::from_labels(labels.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;
    use grapple_core::modularity;

    fn two_triangles() -> Graph {
        Graph::from_edges([(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)])
    }

    #[test]
    fn test_two_triangles() {
        let labels = best_partition(&two_triangles(), 1.0, 0).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_labels_are_dense() {
        let labels = best_partition(&karate_club(), 1.0, 42).unwrap();
        let k = labels.iter().max().unwrap() + 1;
        for c in 0..k {
            assert!(labels.contains(&c));
        }
    }

    #[test]
    fn test_karate_modularity() {
        let g = karate_club();
        let labels = best_partition(&g, 1.0, 42).unwrap();
        let q = modularity(&g, &labels, 1.0).unwrap();
        // Best known partition is ~0.42
        assert!(q > 0.35, "modularity {q}");
    }

    #[test]
    fn test_internal_modularity_matches_core() {
        let g = karate_club();
        let level = Level::from_graph(&g);
        let mut status = Status::singletons(&level);
        let mut rng = XorShiftRng::seed_from_u64(1);
        one_level(&level, &mut status, 1.0, &mut rng);
        let (labels, _) = renumber(&status.node_to_com);
        let expected = modularity(&g, &labels, 1.0).unwrap();
        assert!((status.modularity(&level, 1.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_nodes_keep_own_community() {
        let mut g = two_triangles();
        g.ensure_nodes(8);
        let labels = best_partition(&g, 1.0, 3).unwrap();
        assert_ne!(labels[6], labels[7]);
        assert!(labels[..6].iter().all(|&l| l != labels[6] && l != labels[7]));
    }

    #[test]
    fn test_higher_resolution_gives_more_communities() {
        let g = karate_club();
        let coarse = best_partition(&g, 0.5, 42).unwrap();
        let fine = best_partition(&g, 3.0, 42).unwrap();
        let count = |l: &[usize]| l.iter().max().unwrap() + 1;
        assert!(count(&fine) > count(&coarse));
    }

    #[test]
    fn test_estimator() {
        let mut model = Louvain::default();
        assert!(model.memberships().is_err());
        model.fit(&two_triangles()).unwrap();
        let m = model.memberships().unwrap();
        assert!(!m.is_overlapping());
        assert_eq!(m.community_count(), 2);
    }
}
