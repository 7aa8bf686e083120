//! The uniform estimator interface.
//!
//! Every algorithm is a small struct holding its config and, after fitting,
//! its learned state. Fitting takes a [`Graph`] (plus a [`FeatureMatrix`]
//! for attributed methods); queries afterwards return an embedding or
//! memberships.
//!
//! ```rust,ignore
//! use grapple_core::{Estimator, NodeEmbedding};
//! use grapple_embed::DeepWalk;
//!
//! let mut model = DeepWalk::default();
//! model.fit(&graph)?;
//! let emb = model.embedding()?; // (node_count, dimensions)
//! ```

use crate::{Error, FeatureMatrix, Graph, Memberships, Result};
use ndarray::Array2;

/// An estimator fitted on graph structure alone.
pub trait Estimator {
    /// Short algorithm name, used in logs and errors.
    const NAME: &'static str;

    /// Fit on `graph`, replacing any previous state.
    fn fit(&mut self, graph: &Graph) -> Result<()>;
}

/// An estimator fitted on graph structure plus node features.
pub trait AttributedEstimator {
    const NAME: &'static str;

    /// Fit on `graph` and `features` (one feature row per node).
    fn fit(&mut self, graph: &Graph, features: &FeatureMatrix) -> Result<()>;
}

/// Estimators that produce one vector per node.
pub trait NodeEmbedding {
    /// The `(node_count, dimensions)` embedding; row `i` is node `i`.
    fn embedding(&self) -> Result<Array2<f64>>;
}

/// Estimators that assign nodes to communities.
pub trait CommunityDetection {
    fn memberships(&self) -> Result<Memberships>;
}

/// Check the "one row per node" invariant of an embedding.
pub fn ensure_rows(embedding: &Array2<f64>, node_count: usize) -> Result<()> {
    if embedding.nrows() != node_count {
        return Err(Error::DimensionMismatch {
            expected: node_count,
            got: embedding.nrows(),
        });
    }
    Ok(())
}

/// Return the fitted state or `Error::NotFitted(name)`.
pub fn fitted<'a, T>(state: &'a Option<T>, name: &'static str) -> Result<&'a T> {
    state.as_ref().ok_or(Error::NotFitted(name))
}
