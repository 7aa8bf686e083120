#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

//! Node embedding estimators.
//!
//! `grapple-embed` turns a [`grapple_core::Graph`] into one vector per node.
//! It sits on top of `grapple-core` (graphs, walks, features) and shares a
//! single skip-gram trainer across the walk-based methods.
//!
//! # Modules
//!
//! - [`skipgram`]: Skip-gram with negative sampling over arbitrary tokens
//! - [`deepwalk`]: Uniform walks + skip-gram
//! - [`node2vec`]: Biased second-order walks + skip-gram
//! - [`walklets`]: Per-scale skipped walks, concatenated blocks
//! - [`asne`]: Walklets with interleaved feature tokens (attributed)
//! - [`graphwave`]: Heat-wavelet characteristic functions (structural roles)
//! - [`grarep`]: Truncated SVD of k-step log transition matrices
//! - [`netmf`]: Truncated SVD of the closed-form DeepWalk matrix
//! - [`bane`]: Binary codes from smoothed node features (attributed)
//!
//! | Estimator | Proximity | Output width |
//! |-----------|-----------|--------------|
//! | DeepWalk / Node2Vec | walk co-occurrence | `dimensions` |
//! | Walklets | k-step co-occurrence per k | `dimensions * window_size` |
//! | ASNE | co-occurrence + attributes | `dimensions` |
//! | GraphWave | structural similarity | `2 * sample_number` |
//! | GraRep | k-step transition per k | `dimensions * order` |
//! | NetMF | windowed transition | `dimensions` |
//! | BANE | transition + attributes | `dimensions`, entries `±1` |
//!
//! # Example
//!
//! ```rust
//! use grapple_core::generators::karate_club;
//! use grapple_core::{Estimator, NodeEmbedding};
//! use grapple_embed::{DeepWalk, DeepWalkConfig};
//!
//! let graph = karate_club();
//! let mut model = DeepWalk::new(DeepWalkConfig {
//!     walk_number: 2,
//!     walk_length: 10,
//!     dimensions: 8,
//!     ..Default::default()
//! });
//! model.fit(&graph).unwrap();
//! assert_eq!(model.embedding().unwrap().dim(), (34, 8));
//! ```

pub mod asne;
pub mod bane;
pub mod deepwalk;
pub mod graphwave;
pub mod grarep;
pub mod netmf;
pub mod node2vec;
pub mod skipgram;
pub mod walklets;

pub use asne::{Asne, AsneConfig};
pub use bane::{Bane, BaneConfig};
pub use deepwalk::{DeepWalk, DeepWalkConfig};
pub use graphwave::{GraphWave, GraphWaveConfig};
pub use grarep::{GraRep, GraRepConfig};
pub use netmf::{NetMF, NetMFConfig};
pub use node2vec::{Node2Vec, Node2VecConfig};
pub use skipgram::{SkipGramConfig, Word2Vec};
pub use walklets::{Walklets, WalkletsConfig};
