//! Sparse node feature matrices for attributed estimators.

use crate::{Error, Graph, NodeId, Result};
use ndarray::Array2;
use sprs::{CsMat, TriMat};

/// Sparse `nodes x features` matrix in CSR layout.
///
/// Attributed estimators only look at which features are non-zero for a
/// node; values are kept for callers that need them.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    matrix: CsMat<f64>,
}

impl FeatureMatrix {
    /// Build from `(row, col, value)` triplets. Zero values are dropped and
    /// duplicate coordinates are summed.
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut tri = TriMat::new((rows, cols));
        for (r, c, v) in triplets {
            if r >= rows {
                return Err(Error::DimensionMismatch {
                    expected: rows,
                    got: r + 1,
                });
            }
            if c >= cols {
                return Err(Error::DimensionMismatch {
                    expected: cols,
                    got: c + 1,
                });
            }
            if v != 0.0 {
                tri.add_triplet(r, c, v);
            }
        }
        Ok(Self {
            matrix: tri.to_csr(),
        })
    }

    /// Build from dense rows (all rows must share one length).
    pub fn from_dense_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut triplets = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch {
                    expected: cols,
                    got: row.len(),
                });
            }
            triplets.extend(row.iter().enumerate().map(|(c, &v)| (r, c, v)));
        }
        Self::from_triplets(rows.len(), cols, triplets)
    }

    /// Number of rows (nodes).
    pub fn n_rows(&self) -> usize {
        self.matrix.rows()
    }

    /// Number of columns (features).
    pub fn n_cols(&self) -> usize {
        self.matrix.cols()
    }

    /// Number of stored non-zeros.
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Feature ids with a non-zero value for `node`, ascending.
    pub fn row_features(&self, node: NodeId) -> Vec<usize> {
        self.matrix
            .outer_view(node)
            .map(|row| row.indices().to_vec())
            .unwrap_or_default()
    }

    /// Stored value at `(row, col)`, zero when absent.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col).copied().unwrap_or(0.0)
    }

    /// Require one row per graph node.
    pub fn check_rows(&self, graph: &Graph) -> Result<()> {
        if self.n_rows() != graph.node_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.node_count(),
                got: self.n_rows(),
            });
        }
        Ok(())
    }

    /// Dense `nodes x features` copy.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows(), self.n_cols()));
        for (&v, (r, c)) in self.matrix.iter() {
            dense[[r, c]] = v;
        }
        dense
    }

    /// Underlying sprs matrix.
    pub fn as_csr(&self) -> &CsMat<f64> {
        &self.matrix
    }
}
