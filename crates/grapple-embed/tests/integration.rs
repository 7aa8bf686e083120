//! End-to-end checks of the embedding estimators on small graphs.

use grapple_core::generators::{karate_club, newman_watts_strogatz};
use grapple_core::{AttributedEstimator, Estimator, FeatureMatrix, Graph, NodeEmbedding};
use grapple_embed::{
    Asne, AsneConfig, Bane, BaneConfig, DeepWalk, DeepWalkConfig, GraRep, GraRepConfig,
    GraphWave, GraphWaveConfig, NetMF, NetMFConfig, Node2Vec, Node2VecConfig, Walklets,
    WalkletsConfig,
};
use ndarray::Array2;

fn cosine(emb: &Array2<f64>, a: usize, b: usize) -> f64 {
    let (x, y) = (emb.row(a), emb.row(b));
    x.dot(&y) / (x.dot(&x).sqrt() * y.dot(&y).sqrt())
}

/// Two 6-cliques joined by a single edge.
fn barbell() -> Graph {
    let mut edges = Vec::new();
    for offset in [0, 6] {
        for u in 0..6 {
            for v in (u + 1)..6 {
                edges.push((offset + u, offset + v));
            }
        }
    }
    edges.push((5, 6));
    Graph::from_edges(edges)
}

#[test]
fn deepwalk_separates_barbell_halves() {
    let g = barbell();
    let mut model = DeepWalk::new(DeepWalkConfig {
        walk_number: 20,
        walk_length: 20,
        dimensions: 16,
        window_size: 3,
        epochs: 3,
        ..Default::default()
    });
    model.fit(&g).unwrap();
    let emb = model.embedding().unwrap();

    let within = (cosine(&emb, 0, 1) + cosine(&emb, 7, 8)) / 2.0;
    let across = (cosine(&emb, 0, 8) + cosine(&emb, 1, 7)) / 2.0;
    assert!(within > across, "within {within} across {across}");
}

#[test]
fn matrix_factorizations_separate_barbell_halves() {
    let g = barbell();

    let mut grarep = GraRep::new(GraRepConfig {
        dimensions: 4,
        order: 2,
        ..Default::default()
    });
    grarep.fit(&g).unwrap();
    let mut netmf = NetMF::new(NetMFConfig {
        dimensions: 4,
        ..Default::default()
    });
    netmf.fit(&g).unwrap();

    for emb in [grarep.embedding().unwrap(), netmf.embedding().unwrap()] {
        let within = (cosine(&emb, 0, 1) + cosine(&emb, 7, 8)) / 2.0;
        let across = (cosine(&emb, 0, 8) + cosine(&emb, 1, 7)) / 2.0;
        assert!(within > across, "within {within} across {across}");
    }
}

#[test]
fn every_embedding_has_one_row_per_node() {
    let g = newman_watts_strogatz(50, 4, 0.1, 3).unwrap();
    let n = g.node_count();

    let mut deepwalk = DeepWalk::new(DeepWalkConfig {
        walk_number: 2,
        walk_length: 10,
        dimensions: 8,
        ..Default::default()
    });
    deepwalk.fit(&g).unwrap();
    assert_eq!(deepwalk.embedding().unwrap().dim(), (n, 8));

    let mut node2vec = Node2Vec::new(Node2VecConfig {
        walk_number: 2,
        walk_length: 10,
        dimensions: 8,
        p: 2.0,
        q: 0.5,
        ..Default::default()
    });
    node2vec.fit(&g).unwrap();
    assert_eq!(node2vec.embedding().unwrap().dim(), (n, 8));

    let mut walklets = Walklets::new(WalkletsConfig {
        walk_number: 2,
        walk_length: 10,
        dimensions: 4,
        window_size: 2,
        ..Default::default()
    });
    walklets.fit(&g).unwrap();
    assert_eq!(walklets.embedding().unwrap().dim(), (n, 8));

    let mut graphwave = GraphWave::new(GraphWaveConfig {
        sample_number: 5,
        approximation: 20,
        ..Default::default()
    });
    graphwave.fit(&g).unwrap();
    assert_eq!(graphwave.embedding().unwrap().dim(), (n, 10));

    let mut grarep = GraRep::new(GraRepConfig {
        dimensions: 4,
        order: 3,
        ..Default::default()
    });
    grarep.fit(&g).unwrap();
    assert_eq!(grarep.embedding().unwrap().dim(), (n, 12));

    let mut netmf = NetMF::new(NetMFConfig {
        dimensions: 8,
        ..Default::default()
    });
    netmf.fit(&g).unwrap();
    assert_eq!(netmf.embedding().unwrap().dim(), (n, 8));
}

#[test]
fn asne_with_sparse_features() {
    let g = karate_club();
    // Only half of the nodes carry a feature
    let x = FeatureMatrix::from_triplets(34, 3, (0..34).step_by(2).map(|n| (n, n % 3, 1.0)))
        .unwrap();
    let mut model = Asne::new(AsneConfig {
        dimensions: 8,
        walk_number: 2,
        walk_length: 10,
        ..Default::default()
    });
    model.fit(&g, &x).unwrap();
    let emb = model.embedding().unwrap();
    assert_eq!(emb.dim(), (34, 8));
    assert!(emb.iter().all(|v| v.is_finite()));
}

#[test]
fn bane_codes_on_small_world() {
    let g = newman_watts_strogatz(40, 4, 0.1, 5).unwrap();
    let x = FeatureMatrix::from_triplets(40, 10, (0..40).map(|n| (n, n / 4, 1.0))).unwrap();
    let config = BaneConfig {
        dimensions: 6,
        iterations: 5,
        binarization_iterations: 3,
        ..Default::default()
    };
    let run = || {
        let mut model = Bane::new(config);
        model.fit(&g, &x).unwrap();
        model.embedding().unwrap()
    };
    let emb = run();
    assert_eq!(emb.dim(), (40, 6));
    assert!(emb.iter().all(|&v| v.abs() == 1.0));
    assert_eq!(emb, run());
}

#[test]
fn refit_replaces_state() {
    let mut model = DeepWalk::new(DeepWalkConfig {
        walk_number: 2,
        walk_length: 10,
        dimensions: 4,
        ..Default::default()
    });
    model.fit(&karate_club()).unwrap();
    model.fit(&barbell()).unwrap();
    assert_eq!(model.embedding().unwrap().nrows(), 12);
}
