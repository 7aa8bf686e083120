//! Community memberships (hard or overlapping) and modularity.

use crate::{Error, Graph, NodeId, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Assignment of every node to one or more community ids.
///
/// `assignments[node]` lists the node's communities in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memberships {
    assignments: Vec<Vec<usize>>,
}

impl Memberships {
    /// One community per node.
    pub fn from_labels(labels: Vec<usize>) -> Self {
        Self {
            assignments: labels.into_iter().map(|l| vec![l]).collect(),
        }
    }

    /// Possibly several communities per node. Duplicates are removed.
    pub fn from_overlapping(mut assignments: Vec<Vec<usize>>) -> Self {
        for a in &mut assignments {
            a.sort_unstable();
            a.dedup();
        }
        Self { assignments }
    }

    /// Hard labels from the row-wise argmax of a score matrix.
    ///
    /// Ties resolve to the lowest column; this is how the factorization
    /// based estimators turn affiliation strengths into memberships.
    pub fn from_argmax(scores: &Array2<f64>) -> Self {
        Self::from_labels(scores.rows().into_iter().map(|row| argmax(row.iter())).collect())
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.assignments.len()
    }

    /// Communities of `node` (empty for unknown nodes).
    pub fn of(&self, node: NodeId) -> &[usize] {
        self.assignments.get(node).map_or(&[], Vec::as_slice)
    }

    /// Whether any node belongs to more than one community.
    pub fn is_overlapping(&self) -> bool {
        self.assignments.iter().any(|a| a.len() > 1)
    }

    /// One label per node, or `None` if some node has zero or several.
    pub fn labels(&self) -> Option<Vec<usize>> {
        self.assignments
            .iter()
            .map(|a| if a.len() == 1 { Some(a[0]) } else { None })
            .collect()
    }

    /// Community id -> sorted member nodes.
    pub fn communities(&self) -> BTreeMap<usize, Vec<NodeId>> {
        let mut out: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for (node, comms) in self.assignments.iter().enumerate() {
            for &c in comms {
                out.entry(c).or_default().push(node);
            }
        }
        out
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        self.communities().len()
    }

    /// Renumber communities densely in order of first appearance.
    pub fn relabel(&self) -> Self {
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let assignments = self
            .assignments
            .iter()
            .map(|comms| {
                comms
                    .iter()
                    .map(|c| {
                        let next = remap.len();
                        *remap.entry(*c).or_insert(next)
                    })
                    .collect()
            })
            .collect();
        Self::from_overlapping(assignments)
    }

    /// Raw per-node assignments.
    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.assignments
    }
}

/// Index of the largest value, first one on ties. Zero for empty input.
pub fn argmax<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, &v) in values.into_iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

/// Newman modularity of a hard partition on a weighted graph.
///
/// ```text
/// Q = Σ_c [ L_c / m  -  γ (d_c / 2m)² ]
/// ```
///
/// where `L_c` is the weight inside community `c`, `d_c` its total degree,
/// `m` the total edge weight and `γ` the resolution.
pub fn modularity(graph: &Graph, labels: &[usize], resolution: f64) -> Result<f64> {
    if labels.len() != graph.node_count() {
        return Err(Error::DimensionMismatch {
            expected: graph.node_count(),
            got: labels.len(),
        });
    }
    let m: f64 = graph.edges().map(|(_, _, w)| w).sum();
    if m == 0.0 {
        return Ok(0.0);
    }

    let mut inner: HashMap<usize, f64> = HashMap::new();
    let mut degree: HashMap<usize, f64> = HashMap::new();
    for (u, v, w) in graph.edges() {
        if labels[u] == labels[v] {
            *inner.entry(labels[u]).or_default() += w;
        }
        *degree.entry(labels[u]).or_default() += w;
        *degree.entry(labels[v]).or_default() += w;
    }

    Ok(degree
        .iter()
        .map(|(c, &d)| {
            let l = inner.get(c).copied().unwrap_or(0.0);
            l / m - resolution * (d / (2.0 * m)).powi(2)
        })
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_argmax() {
        let scores = array![[0.1, 0.9], [0.8, 0.2], [0.5, 0.5]];
        let m = Memberships::from_argmax(&scores);
        assert_eq!(m.labels(), Some(vec![1, 0, 0]));
        assert!(!m.is_overlapping());
    }

    #[test]
    fn test_overlapping() {
        let m = Memberships::from_overlapping(vec![vec![0, 1, 1], vec![1], vec![]]);
        assert!(m.is_overlapping());
        assert_eq!(m.of(0), &[0, 1]);
        assert!(m.labels().is_none());
        let comms = m.communities();
        assert_eq!(comms[&1], vec![0, 1]);
        assert_eq!(m.community_count(), 2);
    }

    #[test]
    fn test_relabel() {
        let m = Memberships::from_labels(vec![7, 7, 3, 9]);
        assert_eq!(m.relabel().labels(), Some(vec![0, 0, 1, 2]));
    }

    #[test]
    fn test_modularity_two_triangles() {
        // Two triangles joined by one bridge edge.
        let g = Graph::from_edges([(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)]);
        let q = modularity(&g, &[0, 0, 0, 1, 1, 1], 1.0).unwrap();
        // L_c = 3 each, m = 7, d_c = 7 each.
        let expected = 2.0 * (3.0 / 7.0 - (7.0 / 14.0f64).powi(2));
        assert!((q - expected).abs() < 1e-12);

        let single = modularity(&g, &[0; 6], 1.0).unwrap();
        assert!(single.abs() < 1e-12);
    }

    #[test]
    fn test_modularity_length_mismatch() {
        let g = Graph::from_edges([(0, 1)]);
        assert!(modularity(&g, &[0], 1.0).is_err());
    }
}
