//! Synchronous label propagation.
//!
//! Raghavan, Albert & Kumara, "Near linear time algorithm to detect community
//! structures in large-scale networks" (2007).
//!
//! Every node starts with its own label. Each round visits the nodes in a
//! fresh random order and picks, for each, the label most common among its
//! neighbours (ties broken at random). New labels take effect together at the
//! end of the round.

use grapple_core::estimator::fitted;
use grapple_core::{CommunityDetection, Error, Estimator, Graph, Memberships, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPropagationConfig {
    /// Propagation rounds.
    pub iterations: usize,
    pub seed: u64,
}

impl Default for LabelPropagationConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            seed: 42,
        }
    }
}

impl LabelPropagationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidParameter("iterations must be positive".into()));
        }
        Ok(())
    }
}

/// Most frequent label among `neighbors`, uniform among ties.
fn pick<R: Rng>(labels: &[usize], neighbors: &[usize], rng: &mut R) -> Option<usize> {
    let mut scores: BTreeMap<usize, usize> = BTreeMap::new();
    for &v in neighbors {
        *scores.entry(labels[v]).or_default() += 1;
    }
    let best = *scores.values().max()?;
    let top: Vec<usize> = scores
        .into_iter()
        .filter(|&(_, count)| count == best)
        .map(|(label, _)| label)
        .collect();
    top.choose(rng).copied()
}

/// Label propagation community detection (non-overlapping).
#[derive(Debug, Clone, Default)]
pub struct LabelPropagation {
    config: LabelPropagationConfig,
    labels: Option<Vec<usize>>,
}

impl LabelPropagation {
    pub fn new(config: LabelPropagationConfig) -> Self {
        Self {
            config,
            labels: None,
        }
    }

    pub fn config(&self) -> &LabelPropagationConfig {
        &self.config
    }
}

impl Estimator for LabelPropagation {
    const NAME: &'static str = "LabelPropagation";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let adjacency = graph.adjacency_lists();
        let mut rng = XorShiftRng::seed_from_u64(self.config.seed);
        let mut labels: Vec<usize> = graph.nodes().collect();
        let mut order: Vec<usize> = graph.nodes().collect();

        for round in 0..self.config.iterations {
            order.shuffle(&mut rng);
            let mut next = labels.clone();
            for &node in &order {
                // Isolated nodes keep their label
                if let Some(label) = pick(&labels, &adjacency[node], &mut rng) {
                    next[node] = label;
                }
            }
            let changed = labels.iter().zip(&next).filter(|(a, b)| a != b).count();
            debug!(round, changed, "label propagation round");
            labels = next;
        }

        let memberships = Memberships::from_labels(labels).relabel();
        info!(
            nodes = graph.node_count(),
            communities = memberships.community_count(),
            "LabelPropagation fitted"
        );
        self.labels = memberships.labels();
        Ok(())
    }
}

impl CommunityDetection for LabelPropagation {
    fn memberships(&self) -> Result<Memberships> {
        let labels = fitted(&self.labels, Self::NAME)?;
        Ok(Memberships::from_labels(labels.clone()))
    }
}
