//! Fit every embedding estimator on a small-world graph and print shapes.
//!
//! Run with `cargo run -p grapple-embed --example embed_small_world`.

use grapple_core::generators::newman_watts_strogatz;
use grapple_core::{AttributedEstimator, Estimator, FeatureMatrix, NodeEmbedding};
use grapple_embed::{Asne, DeepWalk, GraphWave, Node2Vec, Walklets};
use rand::prelude::*;
use rand::rngs::StdRng;

fn main() -> grapple_core::Result<()> {
    let graph = newman_watts_strogatz(100, 20, 0.05, 42)?;

    let mut deepwalk = DeepWalk::default();
    deepwalk.fit(&graph)?;
    println!("DeepWalk  {:?}", deepwalk.embedding()?.dim());

    let mut node2vec = Node2Vec::default();
    node2vec.fit(&graph)?;
    println!("Node2Vec  {:?}", node2vec.embedding()?.dim());

    let mut walklets = Walklets::default();
    walklets.fit(&graph)?;
    println!("Walklets  {:?}", walklets.embedding()?.dim());

    let mut graphwave = GraphWave::default();
    graphwave.fit(&graph)?;
    println!("GraphWave {:?}", graphwave.embedding()?.dim());

    // Random binary features, 50 columns at ~5% density
    let mut rng = StdRng::seed_from_u64(42);
    let triplets: Vec<_> = (0..100)
        .flat_map(|node| (0..50).map(move |feature| (node, feature, 1.0)))
        .filter(|_| rng.random_bool(0.05))
        .collect();
    let features = FeatureMatrix::from_triplets(100, 50, triplets)?;

    let mut asne = Asne::default();
    asne.fit(&graph, &features)?;
    println!("ASNE      {:?}", asne.embedding()?.dim());

    Ok(())
}
