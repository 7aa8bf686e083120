//! Dense truncated SVD and symmetric positive definite solves.
//!
//! The SVD works on the Gram matrix `MᵀM`: its leading eigenvectors are the
//! right singular vectors of `M` and its eigenvalues the squared singular
//! values. Eigenpairs are extracted one at a time by power iteration; each
//! found pair is deflated out of the Gram matrix and later iterates are kept
//! orthogonal to it.
//!
//! Forming `MᵀM` squares the condition number, so small singular values are
//! resolved only to about `sqrt(f64::EPSILON)` relative accuracy. The
//! estimators here only keep the leading directions.
//!
//! ```rust
//! use grapple_core::linalg::truncated_svd;
//! use ndarray::array;
//!
//! let m = array![[3.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
//! let svd = truncated_svd(&m, 1, 100, 42).unwrap();
//! assert!((svd.singular_values[0] - 3.0).abs() < 1e-9);
//! ```

use crate::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;

const TOLERANCE: f64 = 1e-12;
const VECTOR_TOLERANCE: f64 = 1e-11;

/// Rank-`k` factorization `M ≈ U diag(σ) Vᵀ`.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    /// Left singular vectors, `(rows, k)`.
    pub u: Array2<f64>,
    /// Singular values, descending.
    pub singular_values: Array1<f64>,
    /// Right singular vectors as rows, `(k, cols)`.
    pub vt: Array2<f64>,
}

impl TruncatedSvd {
    /// `U diag(σ)`: the rows of `M` projected onto the leading directions.
    pub fn projection(&self) -> Array2<f64> {
        &self.u * &self.singular_values
    }

    /// Rank-`k` reconstruction of `M`.
    pub fn reconstruct(&self) -> Array2<f64> {
        self.projection().dot(&self.vt)
    }
}

/// Leading `k` singular triplets of `matrix`.
///
/// `iterations` bounds the power iterations spent on each triplet. Starting
/// vectors are drawn from `seed`, and each right singular vector is oriented
/// so that its largest-magnitude entry is positive; equal inputs give equal
/// outputs.
pub fn truncated_svd(
    matrix: &Array2<f64>,
    k: usize,
    iterations: usize,
    seed: u64,
) -> Result<TruncatedSvd> {
    let (rows, cols) = matrix.dim();
    if k == 0 || k > rows.min(cols) {
        return Err(Error::InvalidParameter(format!(
            "rank {k} out of range for a {rows}x{cols} matrix"
        )));
    }
    if iterations == 0 {
        return Err(Error::InvalidParameter("iterations must be positive".into()));
    }

    let mut gram = matrix.t().dot(matrix);
    let mut rng = XorShiftRng::seed_from_u64(seed);
    let mut vectors: Vec<Array1<f64>> = Vec::with_capacity(k);
    let mut values = Array1::<f64>::zeros(k);

    for i in 0..k {
        let start = Array1::from_shape_fn(cols, |_| rng.random::<f64>() - 0.5);
        let (eigenvalue, v) = power_iteration(&gram, start, &vectors, iterations);
        gram.scaled_add(-eigenvalue, &outer(&v));
        values[i] = eigenvalue.max(0.0).sqrt();
        vectors.push(v);
    }

    let mut u = Array2::zeros((rows, k));
    let mut vt = Array2::zeros((k, cols));
    for (i, v) in vectors.iter().enumerate() {
        vt.row_mut(i).assign(v);
        if values[i] > TOLERANCE {
            u.column_mut(i).assign(&(matrix.dot(v) / values[i]));
        }
    }

    Ok(TruncatedSvd {
        u,
        singular_values: values,
        vt,
    })
}

/// Dominant eigenpair of the symmetric `matrix` restricted to the complement
/// of `found`.
fn power_iteration(
    matrix: &Array2<f64>,
    mut v: Array1<f64>,
    found: &[Array1<f64>],
    iterations: usize,
) -> (f64, Array1<f64>) {
    orthogonalize(&mut v, found);
    normalize(&mut v);

    for _ in 0..iterations {
        let mut next = matrix.dot(&v);
        orthogonalize(&mut next, found);
        if !normalize(&mut next) {
            // Remaining spectrum is zero; v is already a valid direction
            break;
        }
        let delta = &next - &v;
        v = next;
        if delta.dot(&delta).sqrt() <= VECTOR_TOLERANCE {
            break;
        }
    }

    orient(&mut v);
    // Rayleigh quotient, v is unit length
    let eigenvalue = v.dot(&matrix.dot(&v));
    (eigenvalue, v)
}

/// Remove the components of `v` along each (unit) vector in `basis`.
fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let proj = v.dot(b);
        v.scaled_add(-proj, b);
    }
}

/// Scale to unit length; false when `v` is numerically zero.
fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm <= TOLERANCE {
        return false;
    }
    *v /= norm;
    true
}

/// Flip the sign so the largest-magnitude entry is positive.
fn orient(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}

fn outer(v: &Array1<f64>) -> Array2<f64> {
    let col = v.view().insert_axis(Axis(1));
    let row = v.view().insert_axis(Axis(0));
    col.dot(&row)
}

/// Solve `A X = B` for symmetric positive definite `A` by Cholesky.
pub fn solve_spd(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }
    if b.nrows() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: b.nrows(),
        });
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for p in 0..j {
                sum -= l[[i, p]] * l[[j, p]];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(Error::InvalidParameter(
                        "matrix is not positive definite".into(),
                    ));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    let mut x = b.to_owned();
    for col in 0..x.ncols() {
        // L y = b
        for i in 0..n {
            let mut s = x[[i, col]];
            for p in 0..i {
                s -= l[[i, p]] * x[[p, col]];
            }
            x[[i, col]] = s / l[[i, i]];
        }
        // Lᵀ x = y
        for i in (0..n).rev() {
            let mut s = x[[i, col]];
            for p in (i + 1)..n {
                s -= l[[p, i]] * x[[p, col]];
            }
            x[[i, col]] = s / l[[i, i]];
        }
    }
    Ok(x)
}
