//! Ego-network splitting for overlapping communities.
//!
//! Epasto, Lattanzi & Paes Leme, "Ego-Splitting Framework: from
//! Non-Overlapping to Overlapping Clusters" (KDD 2017).
//!
//! 1. For every node `u`, take its ego-net without `u` and split it into
//!    connected components. Each component becomes a *persona* of `u`.
//! 2. Build the persona graph: edge `u-v` becomes an edge between the
//!    persona of `u` whose component contains `v` and the persona of `v`
//!    whose component contains `u`.
//! 3. Partition the persona graph with Louvain. A node belongs to every
//!    community one of its personas landed in.
//!
//! Isolated nodes get a single persona with no edges, hence one community
//! of their own.

use crate::louvain::{best_partition, LouvainConfig};
use grapple_core::estimator::fitted;
use grapple_core::{CommunityDetection, Estimator, Graph, Memberships, NodeId, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Same knobs as Louvain: resolution and seed.
pub type EgoNetSplitterConfig = LouvainConfig;

/// Personas of every node.
#[derive(Debug, Clone, Default)]
pub struct Personas {
    /// `components[u][v]`: persona of `u` facing neighbour `v`.
    components: Vec<HashMap<NodeId, usize>>,
    /// `owner[p]`: original node of persona `p`.
    owner: Vec<NodeId>,
}

impl Personas {
    /// Split every ego-net into connected components.
    pub fn build(graph: &Graph) -> Self {
        let mut personas = Self::default();
        for node in graph.nodes() {
            let neighbors = graph.neighbors(node);
            let mut mapping = HashMap::new();
            if neighbors.is_empty() {
                personas.owner.push(node);
            } else {
                let (ego_net, local_to_global) = graph.subgraph(&neighbors);
                for component in ego_net.connected_components() {
                    let persona = personas.owner.len();
                    personas.owner.push(node);
                    for local in component {
                        mapping.insert(local_to_global[local], persona);
                    }
                }
            }
            personas.components.push(mapping);
        }
        personas
    }

    pub fn count(&self) -> usize {
        self.owner.len()
    }

    /// Original node of persona `p`.
    pub fn owner(&self, persona: usize) -> NodeId {
        self.owner[persona]
    }

    /// Persona graph with one edge per original edge.
    pub fn persona_graph(&self, graph: &Graph) -> Graph {
        let mut personas = Graph::with_nodes(self.count());
        for (u, v, w) in graph.edges() {
            let pair = (self.components[u].get(&v), self.components[v].get(&u));
            if let (Some(&pu), Some(&pv)) = pair {
                personas.add_weighted_edge(pu, pv, w);
            }
        }
        personas
    }
}

/// Ego-splitting overlapping community detection.
#[derive(Debug, Clone, Default)]
pub struct EgoNetSplitter {
    config: EgoNetSplitterConfig,
    memberships: Option<Memberships>,
}

impl EgoNetSplitter {
    pub fn new(config: EgoNetSplitterConfig) -> Self {
        Self {
            config,
            memberships: None,
        }
    }

    pub fn config(&self) -> &EgoNetSplitterConfig {
        &self.config
    }
}

impl Estimator for EgoNetSplitter {
    const NAME: &'static str = "EgoNetSplitter";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let personas = Personas::build(graph);
        let persona_graph = personas.persona_graph(graph);
        debug!(
            personas = personas.count(),
            edges = persona_graph.edge_count(),
            "persona graph built"
        );

        let labels = best_partition(&persona_graph, self.config.resolution, self.config.seed)?;
        let mut assignments = vec![Vec::new(); graph.node_count()];
        for (persona, &community) in labels.iter().enumerate() {
            assignments[personas.owner(persona)].push(community);
        }
        let memberships = Memberships::from_overlapping(assignments);

        info!(
            nodes = graph.node_count(),
            personas = personas.count(),
            communities = memberships.community_count(),
            "EgoNetSplitter fitted"
        );
        self.memberships = Some(memberships);
        Ok(())
    }
}

impl CommunityDetection for EgoNetSplitter {
    fn memberships(&self) -> Result<Memberships> {
        fitted(&self.memberships, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    /// Two triangles sharing node 2 (a bow tie).
    fn bow_tie() -> Graph {
        Graph::from_edges([(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)])
    }

    #[test]
    fn test_bow_tie_centre_has_two_personas() {
        let g = bow_tie();
        let personas = Personas::build(&g);
        // Node 2 splits into {0,1} and {3,4}; every other ego-net is connected
        assert_eq!(personas.count(), 6);
        assert_eq!((0..6).filter(|&p| personas.owner(p) == 2).count(), 2);
    }

    #[test]
    fn test_persona_graph_keeps_edge_count() {
        let g = karate_club();
        let personas = Personas::build(&g);
        assert_eq!(personas.persona_graph(&g).edge_count(), g.edge_count());
    }

    #[test]
    fn test_bow_tie_centre_overlaps() {
        let mut model = EgoNetSplitter::default();
        model.fit(&bow_tie()).unwrap();
        let m = model.memberships().unwrap();
        assert_eq!(m.of(2).len(), 2);
        assert_eq!(m.of(0), m.of(1));
        assert_eq!(m.of(3), m.of(4));
        assert_ne!(m.of(0), m.of(3));
        assert!(m.is_overlapping());
    }

    #[test]
    fn test_every_node_has_a_community() {
        let mut g = karate_club();
        g.ensure_nodes(36);
        let mut model = EgoNetSplitter::default();
        model.fit(&g).unwrap();
        let m = model.memberships().unwrap();
        assert_eq!(m.node_count(), 36);
        assert!((0..36).all(|u| !m.of(u).is_empty()));
        assert_ne!(m.of(34), m.of(35));
    }
}
