//! Small synthetic graphs and the classic karate club network.

use crate::{Error, Graph, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Zachary's karate club edges (34 members, 78 friendships).
const KARATE_EDGES: [(usize, usize); 78] = [
    (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7), (0, 8), (0, 10), (0, 11),
    (0, 12), (0, 13), (0, 17), (0, 19), (0, 21), (0, 31), (1, 2), (1, 3), (1, 7), (1, 13),
    (1, 17), (1, 19), (1, 21), (1, 30), (2, 3), (2, 7), (2, 8), (2, 9), (2, 13), (2, 27),
    (2, 28), (2, 32), (3, 7), (3, 12), (3, 13), (4, 6), (4, 10), (5, 6), (5, 10), (5, 16),
    (6, 16), (8, 30), (8, 32), (8, 33), (9, 33), (13, 33), (14, 32), (14, 33), (15, 32),
    (15, 33), (18, 32), (18, 33), (19, 33), (20, 32), (20, 33), (22, 32), (22, 33),
    (23, 25), (23, 27), (23, 29), (23, 32), (23, 33), (24, 25), (24, 27), (24, 31),
    (25, 31), (26, 29), (26, 33), (27, 33), (28, 31), (28, 33), (29, 32), (29, 33),
    (30, 32), (30, 33), (31, 32), (31, 33), (32, 33),
];

/// Zachary's karate club graph.
pub fn karate_club() -> Graph {
    Graph::from_edges(KARATE_EDGES)
}

/// Ring of `n` nodes, each joined to its `k / 2` nearest neighbors per side.
pub fn ring_lattice(n: usize, k: usize) -> Result<Graph> {
    if k >= n {
        return Err(Error::InvalidParameter(format!(
            "k ({k}) must be smaller than n ({n})"
        )));
    }
    let mut g = Graph::with_nodes(n);
    for u in 0..n {
        for j in 1..=k / 2 {
            g.add_edge(u, (u + j) % n);
        }
    }
    Ok(g)
}

/// Newman-Watts-Strogatz small world graph.
///
/// Starts from [`ring_lattice`] and, for every lattice edge `(u, v)`, adds a
/// shortcut from `u` to a uniformly chosen node with probability `p`.
/// Unlike Watts-Strogatz no lattice edge is removed.
pub fn newman_watts_strogatz(n: usize, k: usize, p: f64, seed: u64) -> Result<Graph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidParameter(format!("p must be in [0, 1], got {p}")));
    }
    let mut g = ring_lattice(n, k)?;
    let mut rng = XorShiftRng::seed_from_u64(seed);
    let lattice: Vec<(usize, usize)> = g.edges().map(|(u, v, _)| (u, v)).collect();

    for (u, _) in lattice {
        if rng.random::<f64>() < p {
            let w = rng.random_range(0..n);
            if w != u && !g.has_edge(u, w) {
                g.add_edge(u, w);
            }
        }
    }
    Ok(g)
}

/// G(n, p) random graph.
pub fn erdos_renyi(n: usize, p: f64, seed: u64) -> Result<Graph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidParameter(format!("p must be in [0, 1], got {p}")));
    }
    let mut g = Graph::with_nodes(n);
    let mut rng = XorShiftRng::seed_from_u64(seed);
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random::<f64>() < p {
                g.add_edge(u, v);
            }
        }
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_karate_club_shape() {
        let g = karate_club();
        assert_eq!(g.node_count(), 34);
        assert_eq!(g.edge_count(), 78);
        assert_eq!(g.degree(33), 17);
        assert_eq!(g.degree(0), 16);
        assert_eq!(g.connected_components().len(), 1);
    }

    #[test]
    fn test_ring_lattice() {
        let g = ring_lattice(10, 4).unwrap();
        assert_eq!(g.edge_count(), 20);
        assert!(g.nodes().all(|u| g.degree(u) == 4));
        assert!(ring_lattice(3, 4).is_err());
    }

    #[test]
    fn test_nws_keeps_lattice() {
        let g = newman_watts_strogatz(100, 10, 0.05, 7).unwrap();
        assert_eq!(g.node_count(), 100);
        assert!(g.edge_count() >= 500);
        for u in 0..100 {
            assert!(g.has_edge(u, (u + 1) % 100));
        }
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_nws_reproducible() {
        let a = newman_watts_strogatz(50, 4, 0.3, 1).unwrap();
        let b = newman_watts_strogatz(50, 4, 0.3, 1).unwrap();
        let ea: Vec<_> = a.edges().collect();
        let eb: Vec<_> = b.edges().collect();
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_erdos_renyi_extremes() {
        assert_eq!(erdos_renyi(10, 0.0, 1).unwrap().edge_count(), 0);
        assert_eq!(erdos_renyi(10, 1.0, 1).unwrap().edge_count(), 45);
    }
}
