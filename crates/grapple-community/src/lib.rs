#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]

//! Community detection estimators.
//!
//! Every estimator fits on a [`grapple_core::Graph`] and reports
//! [`grapple_core::Memberships`]; the factorization-based ones also expose
//! their node factor as an embedding.
//!
//! | Estimator | Approach | Memberships | Embedding |
//! |-----------|----------|-------------|-----------|
//! | [`BigClam`] | affiliation gradient ascent | argmax of `F` | `F` |
//! | [`EgoNetSplitter`] | persona graph + Louvain | overlapping | - |
//! | [`Nnsed`] | symmetric encoder-decoder NMF | argmax of `W` | `W` |
//! | [`Danmf`] | deep autoencoder NMF | argmax of `P` | `[P, V_pᵀ]` |
//! | [`Mnmf`] | modularity-regularized NMF | argmax of `H` | `U` |
//! | [`LabelPropagation`] | majority label rounds | hard | - |
//! | [`EdMot`] | motif cliques + Louvain | hard | - |
//! | [`Louvain`] | modularity optimisation | hard | - |
//!
//! # Example
//!
//! ```rust
//! use grapple_community::{EgoNetSplitter, Louvain};
//! use grapple_core::generators::karate_club;
//! use grapple_core::{modularity, CommunityDetection, Estimator};
//!
//! let graph = karate_club();
//!
//! let mut louvain = Louvain::default();
//! louvain.fit(&graph).unwrap();
//! let labels = louvain.memberships().unwrap().labels().unwrap();
//! assert!(modularity(&graph, &labels, 1.0).unwrap() > 0.3);
//!
//! let mut splitter = EgoNetSplitter::default();
//! splitter.fit(&graph).unwrap();
//! assert_eq!(splitter.memberships().unwrap().node_count(), 34);
//! ```

pub mod bigclam;
pub mod danmf;
pub mod edmot;
pub mod ego_splitter;
pub mod label_propagation;
pub mod louvain;
pub mod mnmf;
pub mod nmf;
pub mod nnsed;

pub use bigclam::{BigClam, BigClamConfig};
pub use danmf::{Danmf, DanmfConfig};
pub use edmot::{EdMot, EdMotConfig};
pub use ego_splitter::{EgoNetSplitter, EgoNetSplitterConfig};
pub use label_propagation::{LabelPropagation, LabelPropagationConfig};
pub use louvain::{best_partition, Louvain, LouvainConfig};
pub use mnmf::{Mnmf, MnmfConfig};
pub use nnsed::{Nnsed, NnsedConfig};
