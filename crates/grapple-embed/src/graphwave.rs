//! GraphWave: structural role embeddings from heat-kernel wavelets.
//!
//! Donnat et al., "Learning Structural Node Embeddings via Diffusion
//! Wavelets" (KDD 2018).
//!
//! # Method
//!
//! 1. Heat wavelets `Ψ = g(L)` with `g(λ) = exp(-τ λ / λ_max)` on the
//!    combinatorial Laplacian `L = D - A`. Column `j` of `Ψ` is the heat
//!    spread from node `j`.
//! 2. Each wavelet is summarized by its empirical characteristic function
//!    `φ_j(t) = mean_i exp(i t Ψ_ij)` sampled at `t = s * step_size`.
//! 3. The embedding concatenates the real and imaginary parts.
//!
//! Nodes with the same local structure get the same distribution of heat,
//! regardless of where they sit in the graph.
//!
//! # Approximation
//!
//! `g(L)` is computed with a Chebyshev polynomial of degree `approximation`
//! on `[0, λ_max]`; `λ_max` is estimated by power iteration and padded by 1%.
//! No eigendecomposition is needed.

use grapple_core::estimator::fitted;
use grapple_core::{ensure_rows, Error, Estimator, Graph, NodeEmbedding, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, info};

const POWER_ITERATIONS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphWaveConfig {
    /// Points sampled from each characteristic function.
    pub sample_number: usize,
    /// Spacing of the sample points.
    pub step_size: f64,
    /// Heat kernel scale `τ`.
    pub heat_coefficient: f64,
    /// Chebyshev polynomial degree.
    pub approximation: usize,
    /// Seeds the power iteration start vector.
    pub seed: u64,
}

impl Default for GraphWaveConfig {
    fn default() -> Self {
        Self {
            sample_number: 200,
            step_size: 0.1,
            heat_coefficient: 1.0,
            approximation: 100,
            seed: 42,
        }
    }
}

impl GraphWaveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_number == 0 {
            return Err(Error::InvalidParameter("sample_number must be positive".into()));
        }
        if self.approximation == 0 {
            return Err(Error::InvalidParameter("approximation must be positive".into()));
        }
        for (name, value) in [
            ("step_size", self.step_size),
            ("heat_coefficient", self.heat_coefficient),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Estimate the largest eigenvalue of a symmetric PSD matrix.
fn largest_eigenvalue(matrix: &Array2<f64>, seed: u64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut v: Array1<f64> = (0..matrix.nrows()).map(|_| rng.random::<f64>() + 0.1).collect();
    let mut lambda = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let w = matrix.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        lambda = v.dot(&w) / v.dot(&v);
        v = w / norm;
    }
    lambda
}

/// Chebyshev coefficients of `g` on `[0, 2a]`, degree `order`.
fn chebyshev_coefficients<F: Fn(f64) -> f64>(g: F, order: usize, a: f64) -> Vec<f64> {
    let n = order + 1;
    (0..=order)
        .map(|k| {
            let sum: f64 = (0..n)
                .map(|j| {
                    let theta = PI * (j as f64 + 0.5) / n as f64;
                    g(a * theta.cos() + a) * (k as f64 * theta).cos()
                })
                .sum();
            2.0 / n as f64 * sum
        })
        .collect()
}

/// `Σ c_k T_k((L - aI)/a)` with the three-term recurrence.
fn chebyshev_matrix(laplacian: &Array2<f64>, coefficients: &[f64], a: f64) -> Array2<f64> {
    let n = laplacian.nrows();
    let shifted = |x: &Array2<f64>| (laplacian.dot(x) - x * a) / a;

    let mut t_prev = Array2::<f64>::eye(n);
    let mut result = &t_prev * (coefficients[0] / 2.0);
    if coefficients.len() == 1 {
        return result;
    }
    let mut t_curr = shifted(&t_prev);
    result.scaled_add(coefficients[1], &t_curr);

    for &c in &coefficients[2..] {
        let t_next = shifted(&t_curr) * 2.0 - &t_prev;
        result.scaled_add(c, &t_next);
        t_prev = t_curr;
        t_curr = t_next;
    }
    result
}

/// GraphWave structural embedding.
#[derive(Debug, Clone, Default)]
pub struct GraphWave {
    config: GraphWaveConfig,
    embedding: Option<Array2<f64>>,
}

impl GraphWave {
    pub fn new(config: GraphWaveConfig) -> Self {
        Self {
            config,
            embedding: None,
        }
    }

    pub fn config(&self) -> &GraphWaveConfig {
        &self.config
    }

    /// Heat wavelet matrix `Ψ`; column `j` is centred on node `j`.
    pub fn wavelets(&self, graph: &Graph) -> Result<Array2<f64>> {
        self.config.validate()?;
        graph.validate()?;

        let laplacian = graph.laplacian_matrix();
        let lmax = largest_eigenvalue(&laplacian, self.config.seed) * 1.01;
        if lmax <= 0.0 {
            return Err(Error::InvalidGraph("Laplacian has no positive eigenvalue".into()));
        }
        let tau = self.config.heat_coefficient;
        let a = lmax / 2.0;
        let coefficients =
            chebyshev_coefficients(|x| (-tau * x / lmax).exp(), self.config.approximation, a);
        debug!(lmax, order = self.config.approximation, "heat kernel approximated");

        Ok(chebyshev_matrix(&laplacian, &coefficients, a))
    }
}

impl Estimator for GraphWave {
    const NAME: &'static str = "GraphWave";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        let psi = self.wavelets(graph)?;
        let n = graph.node_count();
        let samples = self.config.sample_number;

        let mut embedding = Array2::zeros((n, 2 * samples));
        for (j, column) in psi.columns().into_iter().enumerate() {
            for s in 0..samples {
                let t = s as f64 * self.config.step_size;
                let (mut re, mut im) = (0.0, 0.0);
                for &x in column {
                    re += (t * x).cos();
                    im += (t * x).sin();
                }
                embedding[[j, s]] = re / n as f64;
                embedding[[j, samples + s]] = im / n as f64;
            }
        }
        ensure_rows(&embedding, n)?;

        info!(nodes = n, dim = embedding.ncols(), "GraphWave fitted");
        self.embedding = Some(embedding);
        Ok(())
    }
}

impl NodeEmbedding for GraphWave {
    fn embedding(&self) -> Result<Array2<f64>> {
        fitted(&self.embedding, Self::NAME).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::ring_lattice;

    fn small() -> GraphWaveConfig {
        GraphWaveConfig {
            sample_number: 20,
            approximation: 30,
            ..Default::default()
        }
    }

    fn row_distance(emb: &Array2<f64>, a: usize, b: usize) -> f64 {
        (&emb.row(a) - &emb.row(b)).mapv(|x| x * x).sum().sqrt()
    }

    #[test]
    fn test_largest_eigenvalue_of_path() {
        // P3 Laplacian eigenvalues: 0, 1, 3
        let g = Graph::from_edges([(0, 1), (1, 2)]);
        let lambda = largest_eigenvalue(&g.laplacian_matrix(), 1);
        assert!((lambda - 3.0).abs() < 1e-6, "lambda {lambda}");
    }

    #[test]
    fn test_chebyshev_matches_scalar_function() {
        // On a 1x1 "Laplacian" the polynomial is just g evaluated at that value
        let l = Array2::from_elem((1, 1), 0.7);
        let coefficients = chebyshev_coefficients(|x: f64| (-x).exp(), 20, 1.0);
        let approx = chebyshev_matrix(&l, &coefficients, 1.0);
        assert!((approx[[0, 0]] - (-0.7f64).exp()).abs() < 1e-8);
    }

    #[test]
    fn test_output_width() {
        let g = Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        let mut model = GraphWave::new(small());
        model.fit(&g).unwrap();
        assert_eq!(model.embedding().unwrap().dim(), (4, 40));
    }

    #[test]
    fn test_first_sample_is_one_plus_zero_i() {
        let g = Graph::from_edges([(0, 1), (1, 2)]);
        let mut model = GraphWave::new(small());
        model.fit(&g).unwrap();
        let emb = model.embedding().unwrap();
        for row in emb.rows() {
            assert!((row[0] - 1.0).abs() < 1e-12);
            assert!(row[20].abs() < 1e-12);
        }
    }

    #[test]
    fn test_ring_nodes_are_structurally_equivalent() {
        let g = ring_lattice(12, 2).unwrap();
        let mut model = GraphWave::new(small());
        model.fit(&g).unwrap();
        let emb = model.embedding().unwrap();
        for v in 1..12 {
            assert!(row_distance(&emb, 0, v) < 1e-6);
        }
    }

    #[test]
    fn test_star_center_differs_from_leaves() {
        let g = Graph::from_edges([(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]);
        let mut model = GraphWave::new(small());
        model.fit(&g).unwrap();
        let emb = model.embedding().unwrap();
        assert!(row_distance(&emb, 1, 2) < 1e-6);
        assert!(row_distance(&emb, 0, 1) > 1e-3);
    }
}
