use crate::{Error, Result};
use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;

/// Node identifier. Nodes of a [`Graph`] are always the integers `0..n`.
pub type NodeId = usize;

/// An undirected, optionally weighted graph over consecutive node ids.
///
/// Uses petgraph's `UnGraph` internally. Node `i` is stored at
/// `NodeIndex::new(i)`, so estimators can index dense matrices by node id
/// without a lookup table.
///
/// # Example
///
/// ```rust
/// use grapple_core::Graph;
///
/// let g = Graph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3)]);
///
/// assert_eq!(g.node_count(), 4);
/// assert_eq!(g.edge_count(), 4);
/// assert_eq!(g.neighbors(2), vec![0, 1, 3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graph {
    graph: UnGraph<(), f64>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    /// Create a graph with `n` isolated nodes.
    pub fn with_nodes(n: usize) -> Self {
        let mut g = Self {
            graph: UnGraph::with_capacity(n, 0),
        };
        g.ensure_nodes(n);
        g
    }

    /// Build an unweighted graph from an edge list.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut g = Self::new();
        for (u, v) in edges {
            g.add_edge(u, v);
        }
        g
    }

    /// Build a weighted graph from `(u, v, weight)` triples.
    pub fn from_weighted_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId, f64)>,
    {
        let mut g = Self::new();
        for (u, v, w) in edges {
            g.add_weighted_edge(u, v, w);
        }
        g
    }

    /// Append a new isolated node and return its id.
    pub fn add_node(&mut self) -> NodeId {
        self.graph.add_node(()).index()
    }

    /// Grow the node set so that ids `0..n` exist.
    pub fn ensure_nodes(&mut self, n: usize) {
        while self.graph.node_count() < n {
            self.graph.add_node(());
        }
    }

    /// Add an edge with weight 1.0.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        self.add_weighted_edge(u, v, 1.0);
    }

    /// Add a weighted edge, creating missing endpoint nodes.
    ///
    /// Adding an edge that already exists overwrites its weight.
    pub fn add_weighted_edge(&mut self, u: NodeId, v: NodeId, weight: f64) {
        self.ensure_nodes(u.max(v) + 1);
        self.graph
            .update_edge(NodeIndex::new(u), NodeIndex::new(v), weight);
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of (undirected) edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node ids.
    pub fn nodes(&self) -> Range<NodeId> {
        0..self.node_count()
    }

    /// Iterate edges as `(u, v, weight)` with `u <= v`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b), *e.weight())
        })
    }

    /// Sorted neighbor ids of `u`. Empty for unknown nodes.
    pub fn neighbors(&self, u: NodeId) -> Vec<NodeId> {
        if u >= self.node_count() {
            return Vec::new();
        }
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors(NodeIndex::new(u))
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Sorted neighbor lists for every node, indexed by node id.
    pub fn adjacency_lists(&self) -> Vec<Vec<NodeId>> {
        self.nodes().map(|u| self.neighbors(u)).collect()
    }

    /// Weighted neighbor lists for every node.
    pub fn weighted_adjacency_lists(&self) -> Vec<Vec<(NodeId, f64)>> {
        let mut lists = vec![Vec::new(); self.node_count()];
        for (u, v, w) in self.edges() {
            lists[u].push((v, w));
            if u != v {
                lists[v].push((u, w));
            }
        }
        for list in &mut lists {
            list.sort_by_key(|&(n, _)| n);
        }
        lists
    }

    /// Number of distinct neighbors.
    pub fn degree(&self, u: NodeId) -> usize {
        self.neighbors(u).len()
    }

    /// Sum of incident edge weights.
    pub fn weighted_degree(&self, u: NodeId) -> f64 {
        if u >= self.node_count() {
            return 0.0;
        }
        self.graph
            .edges(NodeIndex::new(u))
            .map(|e| *e.weight())
            .sum()
    }

    /// Whether `u` and `v` are adjacent.
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.edge_weight(u, v).is_some()
    }

    /// Weight of the edge between `u` and `v`, if any.
    pub fn edge_weight(&self, u: NodeId, v: NodeId) -> Option<f64> {
        let n = self.node_count();
        if u >= n || v >= n {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(u), NodeIndex::new(v))
            .map(|e| self.graph[e])
    }

    /// Number of neighbors shared by `u` and `v` (triangles through edge `u-v`).
    pub fn common_neighbors(&self, u: NodeId, v: NodeId) -> usize {
        let a = self.neighbors(u);
        let b = self.neighbors(v);
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }

    /// Induced subgraph over `nodes`.
    ///
    /// Returns the subgraph (relabelled `0..nodes.len()`) and the map from
    /// local id back to the original node id.
    pub fn subgraph(&self, nodes: &[NodeId]) -> (Graph, Vec<NodeId>) {
        let local: HashMap<NodeId, NodeId> =
            nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let mut sub = Graph::with_nodes(nodes.len());
        for (&orig, &i) in &local {
            for (v, w) in self.weighted_neighbors(orig) {
                if let Some(&j) = local.get(&v) {
                    if i <= j {
                        sub.add_weighted_edge(i, j, w);
                    }
                }
            }
        }
        (sub, nodes.to_vec())
    }

    fn weighted_neighbors(&self, u: NodeId) -> Vec<(NodeId, f64)> {
        if u >= self.node_count() {
            return Vec::new();
        }
        self.graph
            .edges(NodeIndex::new(u))
            .map(|e| {
                let other = if e.source().index() == u {
                    e.target().index()
                } else {
                    e.source().index()
                };
                (other, *e.weight())
            })
            .collect()
    }

    /// Connected components, each sorted, ordered by smallest member.
    ///
    /// Uses Union-Find, O(V + E * alpha(V)).
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.node_count();
        let mut parent: Vec<usize> = (0..n).collect();
        let mut rank = vec![0usize; n];

        for (u, v, _) in self.edges() {
            uf_union(&mut parent, &mut rank, u, v);
        }

        let mut by_root: HashMap<usize, Vec<NodeId>> = HashMap::new();
        for u in 0..n {
            let root = uf_find(&mut parent, u);
            by_root.entry(root).or_default().push(u);
        }
        let mut components: Vec<Vec<NodeId>> = by_root.into_values().collect();
        components.sort_by_key(|c| c[0]);
        components
    }

    /// Dense symmetric adjacency matrix (weights on entries).
    pub fn adjacency_matrix(&self) -> Array2<f64> {
        let n = self.node_count();
        let mut a = Array2::zeros((n, n));
        for (u, v, w) in self.edges() {
            a[[u, v]] = w;
            a[[v, u]] = w;
        }
        a
    }

    /// Diagonal matrix of weighted degrees.
    pub fn degree_matrix(&self) -> Array2<f64> {
        let n = self.node_count();
        let mut d = Array2::zeros((n, n));
        for u in 0..n {
            d[[u, u]] = self.weighted_degree(u);
        }
        d
    }

    /// Random walk transition matrix `P = D⁻¹A`.
    ///
    /// Rows of isolated nodes are zero.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let mut p = self.adjacency_matrix();
        for (u, mut row) in p.rows_mut().into_iter().enumerate() {
            let d = self.weighted_degree(u);
            if d > 0.0 {
                row /= d;
            }
        }
        p
    }

    /// Combinatorial Laplacian `L = D - A`.
    pub fn laplacian_matrix(&self) -> Array2<f64> {
        self.degree_matrix() - self.adjacency_matrix()
    }

    /// Check the structural requirements every estimator relies on.
    pub fn validate(&self) -> Result<()> {
        if self.node_count() == 0 {
            return Err(Error::InvalidGraph("graph has no nodes".into()));
        }
        if self.edge_count() == 0 {
            return Err(Error::InvalidGraph("graph has no edges".into()));
        }
        if let Some((u, _, _)) = self.edges().find(|(u, v, _)| u == v) {
            return Err(Error::InvalidGraph(format!("self-loop on node {u}")));
        }
        Ok(())
    }

    /// Underlying petgraph for advanced operations.
    pub fn as_petgraph(&self) -> &UnGraph<(), f64> {
        &self.graph
    }
}

fn uf_find(parent: &mut [usize], i: usize) -> usize {
    let p = parent[i];
    if p != i {
        parent[i] = uf_find(parent, p);
    }
    parent[i]
}

fn uf_union(parent: &mut [usize], rank: &mut [usize], x: usize, y: usize) {
    let px = uf_find(parent, x);
    let py = uf_find(parent, y);
    if px == py {
        return;
    }
    match rank[px].cmp(&rank[py]) {
        Ordering::Less => parent[px] = py,
        Ordering::Greater => parent[py] = px,
        Ordering::Equal => {
            parent[py] = px;
            rank[px] += 1;
        }
    }
}

/// Summary statistics about a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// `2E / (N (N - 1))`.
    pub density: f64,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub isolated_nodes: usize,
    pub component_count: usize,
}

impl Graph {
    /// Compute summary statistics.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        let e = self.edge_count();
        let degrees: Vec<usize> = self.nodes().map(|u| self.degree(u)).collect();
        let density = if n > 1 {
            2.0 * e as f64 / (n as f64 * (n - 1) as f64)
        } else {
            0.0
        };
        let avg_degree = if n > 0 {
            degrees.iter().sum::<usize>() as f64 / n as f64
        } else {
            0.0
        };

        GraphStats {
            node_count: n,
            edge_count: e,
            density,
            avg_degree,
            max_degree: degrees.iter().copied().max().unwrap_or(0),
            isolated_nodes: degrees.iter().filter(|&&d| d == 0).count(),
            component_count: self.connected_components().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edges_grows_nodes() {
        let mut g = Graph::new();
        g.add_edge(0, 3);
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.degree(1), 0);
    }

    #[test]
    fn test_parallel_edges_collapse() {
        let mut g = Graph::new();
        g.add_edge(0, 1);
        g.add_weighted_edge(1, 0, 2.5);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_weight(0, 1), Some(2.5));
    }

    #[test]
    fn test_neighbors_sorted() {
        let g = Graph::from_edges([(2, 5), (2, 0), (2, 3)]);
        assert_eq!(g.neighbors(2), vec![0, 3, 5]);
        assert!(g.neighbors(42).is_empty());
    }

    #[test]
    fn test_common_neighbors() {
        // 0 and 1 share 2 and 3
        let g = Graph::from_edges([(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (1, 4)]);
        assert_eq!(g.common_neighbors(0, 1), 2);
        assert_eq!(g.common_neighbors(0, 4), 1);
    }

    #[test]
    fn test_connected_components() {
        let mut g = Graph::from_edges([(0, 1), (1, 2), (3, 4)]);
        g.ensure_nodes(6);
        let comps = g.connected_components();
        assert_eq!(comps, vec![vec![0, 1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_subgraph() {
        let g = Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 0)]);
        let (sub, map) = g.subgraph(&[1, 2, 3]);
        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(map, vec![1, 2, 3]);
        assert!(sub.has_edge(0, 1));
        assert!(!sub.has_edge(0, 2));
    }

    #[test]
    fn test_laplacian_rows_sum_to_zero() {
        let g = Graph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3)]);
        let l = g.laplacian_matrix();
        for row in l.rows() {
            assert!(row.sum().abs() < 1e-12);
        }
        assert_eq!(l[[2, 2]], 3.0);
    }

    #[test]
    fn test_transition_matrix_rows_are_stochastic() {
        let mut g = Graph::from_weighted_edges([(0, 1, 1.0), (1, 2, 3.0)]);
        g.ensure_nodes(4);
        let p = g.transition_matrix();
        assert_eq!(p[[0, 1]], 1.0);
        assert_eq!(p[[1, 0]], 0.25);
        assert_eq!(p[[1, 2]], 0.75);
        assert_eq!(p.row(3).sum(), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(Graph::new().validate().is_err());
        assert!(Graph::with_nodes(3).validate().is_err());
        assert!(Graph::from_edges([(0, 0), (0, 1)]).validate().is_err());
        assert!(Graph::from_edges([(0, 1)]).validate().is_ok());
    }

    #[test]
    fn test_stats() {
        let mut g = Graph::from_edges([(0, 1), (1, 2), (2, 0)]);
        g.ensure_nodes(4);
        let s = g.stats();
        assert_eq!(s.node_count, 4);
        assert_eq!(s.edge_count, 3);
        assert_eq!(s.isolated_nodes, 1);
        assert_eq!(s.component_count, 2);
        assert_eq!(s.max_degree, 2);
        assert!((s.density - 0.5).abs() < 1e-12);
    }
}
