//! Property-based tests for the graph substrate.
//!
//! These verify invariants every estimator depends on:
//! - node ids stay consecutive and neighbor lists symmetric
//! - walk corpora start from every node and only follow edges
//! - modularity stays within its theoretical bounds

use grapple_core::walk::{generate_walks, WalkConfig};
use grapple_core::{modularity, Graph, Memberships};
use proptest::prelude::*;

prop_compose! {
    fn arb_graph()(n in 2usize..25)(
        n in Just(n),
        edges in prop::collection::vec((0..n, 0..n), 1..60),
    ) -> Graph {
        let mut g = Graph::with_nodes(n);
        for (u, v) in edges {
            if u != v {
                g.add_edge(u, v);
            }
        }
        g
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn neighbor_lists_are_symmetric(g in arb_graph()) {
        for u in g.nodes() {
            for v in g.neighbors(u) {
                prop_assert!(g.neighbors(v).contains(&u));
            }
        }
    }

    #[test]
    fn degrees_sum_to_twice_edges(g in arb_graph()) {
        let total: usize = g.nodes().map(|u| g.degree(u)).sum();
        prop_assert_eq!(total, 2 * g.edge_count());
    }

    #[test]
    fn components_partition_nodes(g in arb_graph()) {
        let comps = g.connected_components();
        let mut seen: Vec<usize> = comps.into_iter().flatten().collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, g.nodes().collect::<Vec<_>>());
    }

    #[test]
    fn walks_follow_edges(
        g in arb_graph(),
        walk_length in 1usize..15,
        walk_number in 1usize..4,
        p in prop::sample::select(vec![0.25f32, 1.0, 4.0]),
        q in prop::sample::select(vec![0.25f32, 1.0, 4.0]),
        seed in any::<u64>(),
    ) {
        let config = WalkConfig { walk_length, walk_number, p, q, seed };
        let walks = generate_walks(&g, config).unwrap();

        prop_assert_eq!(walks.len(), walk_number * g.node_count());
        for u in g.nodes() {
            prop_assert_eq!(walks.iter().filter(|w| w[0] == u).count(), walk_number);
        }
        for walk in &walks {
            prop_assert!(!walk.is_empty() && walk.len() <= walk_length);
            for pair in walk.windows(2) {
                prop_assert!(g.has_edge(pair[0], pair[1]));
            }
            // Early stop only at dead ends
            if walk.len() < walk_length {
                let last = walk[walk.len() - 1];
                prop_assert_eq!(g.degree(last), 0);
            }
        }
    }

    #[test]
    fn modularity_is_bounded(g in arb_graph(), k in 1usize..5) {
        prop_assume!(g.edge_count() > 0);
        let labels: Vec<usize> = g.nodes().map(|u| u % k).collect();
        let q = modularity(&g, &labels, 1.0).unwrap();
        prop_assert!((-0.5 - 1e-9..=1.0).contains(&q), "modularity {} out of range", q);
    }

    #[test]
    fn relabel_preserves_partition(labels in prop::collection::vec(0usize..50, 1..40)) {
        let m = Memberships::from_labels(labels.clone());
        let relabelled = m.relabel().labels().unwrap();
        for i in 0..labels.len() {
            for j in 0..labels.len() {
                prop_assert_eq!(labels[i] == labels[j], relabelled[i] == relabelled[j]);
            }
        }
        prop_assert!(relabelled.iter().all(|&l| l < labels.len()));
    }
}
