#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

//! Shared substrate for grapple's graph embedding and community detection
//! estimators.
//!
//! - [`Graph`] - undirected, optionally weighted graph over nodes `0..n`
//! - [`FeatureMatrix`] - sparse node features for attributed estimators
//! - [`walk`] - DeepWalk / node2vec random walk corpora
//! - [`Memberships`] - hard or overlapping community assignments
//! - [`Estimator`], [`AttributedEstimator`], [`NodeEmbedding`],
//!   [`CommunityDetection`] - the uniform fit/query interface
//! - [`generators`] - karate club and small-world test graphs
//! - [`formats`] - CSV/JSON readers and writers
//! - [`linalg`] - truncated SVD and SPD solves for matrix factorization methods
//!
//! # Two Families of Estimators
//!
//! | Family | Input | Output | Examples |
//! |--------|-------|--------|----------|
//! | Node embedding | graph (+ features) | `(n, d)` matrix | DeepWalk, Walklets, ASNE |
//! | Community detection | graph | node -> community id(s) | BigClam, EdMot, label propagation |
//!
//! Both follow the same shape: configure, `fit`, query.
//!
//! # Example
//!
//! ```rust
//! use grapple_core::generators::karate_club;
//! use grapple_core::walk::{generate_walks, WalkConfig};
//!
//! let g = karate_club();
//! let config = WalkConfig {
//!     walk_length: 5,
//!     walk_number: 2,
//!     ..Default::default()
//! };
//! let walks = generate_walks(&g, config).unwrap();
//! assert_eq!(walks.len(), 2 * g.node_count());
//! ```

mod error;
pub mod estimator;
mod features;
pub mod formats;
pub mod generators;
mod graph;
pub mod linalg;
pub mod membership;
pub mod walk;

pub use error::{Error, Result};
pub use estimator::{
    ensure_rows, AttributedEstimator, CommunityDetection, Estimator, NodeEmbedding,
};
pub use features::FeatureMatrix;
pub use graph::{Graph, GraphStats, NodeId};
pub use membership::{modularity, Memberships};

// Re-export for callers building on the same matrix/graph types
pub use ndarray;
pub use petgraph;
