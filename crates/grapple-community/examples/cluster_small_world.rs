//! Run every community detector on Newman-Watts-Strogatz graphs.
//!
//! Run with `cargo run -p grapple-community --example cluster_small_world`.

use grapple_community::{
    BigClam, Danmf, EdMot, EdMotConfig, EgoNetSplitter, LabelPropagation, Louvain, Mnmf, Nnsed,
};
use grapple_core::generators::newman_watts_strogatz;
use grapple_core::{modularity, CommunityDetection, Estimator, Graph, Memberships};

fn report(name: &str, graph: &Graph, memberships: &Memberships) -> grapple_core::Result<()> {
    let quality = match memberships.labels() {
        Some(labels) => format!("modularity {:.3}", modularity(graph, &labels, 1.0)?),
        None => "overlapping".to_string(),
    };
    println!(
        "{name:<18} {:>3} communities  {quality}",
        memberships.community_count()
    );
    Ok(())
}

fn main() -> grapple_core::Result<()> {
    let dense = newman_watts_strogatz(100, 20, 0.05, 42)?;
    let sparse = newman_watts_strogatz(100, 10, 0.02, 42)?;
    let noisy = newman_watts_strogatz(100, 10, 0.9, 42)?;

    let mut bigclam = BigClam::default();
    bigclam.fit(&dense)?;
    report("BigClam", &dense, &bigclam.memberships()?)?;

    let mut splitter = EgoNetSplitter::default();
    splitter.fit(&dense)?;
    report("EgoNetSplitter", &dense, &splitter.memberships()?)?;

    let mut edmot = EdMot::new(EdMotConfig {
        component_count: 3,
        cutoff: 0.5,
        ..Default::default()
    });
    edmot.fit(&noisy)?;
    report("EdMot", &noisy, &edmot.memberships()?)?;

    let mut danmf = Danmf::default();
    danmf.fit(&sparse)?;
    report("DANMF", &sparse, &danmf.memberships()?)?;

    let mut mnmf = Mnmf::default();
    mnmf.fit(&sparse)?;
    report("M-NMF", &sparse, &mnmf.memberships()?)?;

    let mut label_propagation = LabelPropagation::default();
    label_propagation.fit(&sparse)?;
    report("LabelPropagation", &sparse, &label_propagation.memberships()?)?;

    let mut nnsed = Nnsed::default();
    nnsed.fit(&sparse)?;
    report("NNSED", &sparse, &nnsed.memberships()?)?;

    let mut louvain = Louvain::default();
    louvain.fit(&sparse)?;
    report("Louvain", &sparse, &louvain.memberships()?)?;

    Ok(())
}
