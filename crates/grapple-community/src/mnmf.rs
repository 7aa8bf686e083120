//! Modularity-regularized NMF (M-NMF).
//!
//! Wang et al., "Community Preserving Network Embedding" (AAAI 2017).
//!
//! Jointly learns node representations `U` and community indicators `H`:
//!
//! ```text
//! ||S - M Uᵀ||²  +  α ||H - U Cᵀ||²  -  β tr(Hᵀ B H)  +  λ ||Hᵀ H - I||²
//! ```
//!
//! - `S = A + η (A ⊙ A²)`: first- plus second-order proximity
//! - `B`: modularity matrix, `d_u d_v / 2m` on edges
//! - `C`: community centres in representation space
//!
//! `M`, `U`, `C` use multiplicative updates; `H` uses the closed-form root of
//! the quadratic in the original derivation. Each factor is row-normalized
//! after its update.

use crate::nmf::{multiplicative_update, normalize_rows, uniform_matrix};
use grapple_core::estimator::fitted;
use grapple_core::{
    CommunityDetection, Error, Estimator, Graph, Memberships, NodeEmbedding, Result,
};
use ndarray::{Array2, Zip};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MnmfConfig {
    /// Representation dimension.
    pub dimensions: usize,
    /// Number of communities.
    pub clusters: usize,
    /// Orthogonality penalty on `H`.
    pub lambd: f64,
    /// Weight of the representation/community link.
    pub alpha: f64,
    /// Weight of the modularity term.
    pub beta: f64,
    pub iterations: usize,
    /// Denominator floor.
    pub lower_control: f64,
    /// Weight of second-order proximity in `S`.
    pub eta: f64,
    pub seed: u64,
}

impl Default for MnmfConfig {
    fn default() -> Self {
        Self {
            dimensions: 128,
            clusters: 10,
            lambd: 0.2,
            alpha: 0.05,
            beta: 0.05,
            iterations: 200,
            lower_control: 1e-15,
            eta: 5.0,
            seed: 42,
        }
    }
}

impl MnmfConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 || self.clusters == 0 {
            return Err(Error::InvalidParameter(
                "dimensions and clusters must be positive".into(),
            ));
        }
        for (name, value) in [
            ("lambd", self.lambd),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("eta", self.eta),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if !(self.lower_control.is_finite() && self.lower_control > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "lower_control must be positive, got {}",
                self.lower_control
            )));
        }
        Ok(())
    }
}

/// `d_u d_v / 2m` on every edge (both directions), zero elsewhere.
fn modularity_matrix(graph: &Graph) -> Array2<f64> {
    let n = graph.node_count();
    let two_m = 2.0 * graph.edge_count() as f64;
    let mut b = Array2::zeros((n, n));
    for (u, v, _) in graph.edges() {
        let value = graph.degree(u) as f64 * graph.degree(v) as f64 / two_m;
        b[[u, v]] = value;
        b[[v, u]] = value;
    }
    b
}

#[derive(Debug, Clone)]
struct State {
    m: Array2<f64>,
    u: Array2<f64>,
    h: Array2<f64>,
    c: Array2<f64>,
}

/// M-NMF community detection and embedding.
#[derive(Debug, Clone, Default)]
pub struct Mnmf {
    config: MnmfConfig,
    state: Option<State>,
}

impl Mnmf {
    pub fn new(config: MnmfConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &MnmfConfig {
        &self.config
    }

    /// Community centres `C` (`clusters x dimensions`).
    pub fn cluster_centers(&self) -> Result<Array2<f64>> {
        Ok(fitted(&self.state, Self::NAME)?.c.clone())
    }

    fn update_m(&self, state: &mut State, s: &Array2<f64>) {
        let numerator = s.dot(&state.u);
        let denominator = state.m.dot(&state.u.t().dot(&state.u));
        multiplicative_update(&mut state.m, &numerator, &denominator, self.config.lower_control);
        normalize_rows(&mut state.m);
    }

    fn update_u(&self, state: &mut State, s: &Array2<f64>) {
        let alpha = self.config.alpha;
        let numerator = s.t().dot(&state.m) + state.h.dot(&state.c) * alpha;
        let inner = state.m.t().dot(&state.m) + state.c.t().dot(&state.c) * alpha;
        let denominator = state.u.dot(&inner);
        multiplicative_update(&mut state.u, &numerator, &denominator, self.config.lower_control);
        normalize_rows(&mut state.u);
    }

    fn update_c(&self, state: &mut State) {
        let numerator = state.h.t().dot(&state.u);
        let denominator = state.c.dot(&state.u.t().dot(&state.u));
        multiplicative_update(&mut state.c, &numerator, &denominator, self.config.lower_control);
        normalize_rows(&mut state.c);
    }

    fn update_h(&self, state: &mut State, a: &Array2<f64>, b: &Array2<f64>) {
        let MnmfConfig {
            alpha,
            beta,
            lambd,
            lower_control,
            ..
        } = self.config;

        let b1h = a.dot(&state.h);
        let b2h = b.dot(&state.h);
        let hhh = state.h.dot(&state.h.t().dot(&state.h));
        let uc = state.u.dot(&state.c.t());

        let linear =
            &b1h * (2.0 * beta) + &uc * (2.0 * alpha) + &state.h * (4.0 * lambd - 2.0 * alpha);
        let mut factor = Array2::zeros(state.h.dim());
        Zip::from(&mut factor)
            .and(&b2h)
            .and(&hhh)
            .and(&linear)
            .for_each(|f, &b2, &h3, &lin| {
                let rooted = (2.0 * beta * b2).powi(2) + 16.0 * lambd * h3 * lin;
                let numerator = -2.0 * beta * b2 + rooted.max(0.0).sqrt();
                let denominator = (8.0 * lambd * h3).max(lower_control);
                *f = (numerator / denominator).max(0.0).sqrt();
            });

        state.h *= &factor;
        normalize_rows(&mut state.h);
    }
}

impl Estimator for Mnmf {
    const NAME: &'static str = "M-NMF";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let n = graph.node_count();
        let MnmfConfig {
            dimensions,
            clusters,
            ..
        } = self.config;

        let a = graph.adjacency_matrix();
        let b = modularity_matrix(graph);
        let s = &a + &(&a * &a.dot(&a) * self.config.eta);

        let mut rng = XorShiftRng::seed_from_u64(self.config.seed);
        let mut state = State {
            m: uniform_matrix(n, dimensions, &mut rng),
            u: uniform_matrix(n, dimensions, &mut rng),
            h: uniform_matrix(n, clusters, &mut rng),
            c: uniform_matrix(clusters, dimensions, &mut rng),
        };

        for iteration in 0..self.config.iterations {
            self.update_m(&mut state, &s);
            self.update_u(&mut state, &s);
            self.update_c(&mut state);
            self.update_h(&mut state, &a, &b);
            debug!(iteration, "M-NMF update");
        }

        info!(nodes = n, dimensions, clusters, "M-NMF fitted");
        self.state = Some(state);
        Ok(())
    }
}

impl NodeEmbedding for Mnmf {
    /// Node representations `U`.
    fn embedding(&self) -> Result<Array2<f64>> {
        Ok(fitted(&self.state, Self::NAME)?.u.clone())
    }
}

impl CommunityDetection for Mnmf {
    fn memberships(&self) -> Result<Memberships> {
        Ok(Memberships::from_argmax(&fitted(&self.state, Self::NAME)?.h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::generators::karate_club;

    fn small() -> MnmfConfig {
        MnmfConfig {
            dimensions: 8,
            clusters: 3,
            iterations: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_shapes() {
        let mut model = Mnmf::new(small());
        model.fit(&karate_club()).unwrap();
        assert_eq!(model.embedding().unwrap().dim(), (34, 8));
        assert_eq!(model.cluster_centers().unwrap().dim(), (3, 8));
        let labels = model.memberships().unwrap().labels().unwrap();
        assert!(labels.iter().all(|&c| c < 3));
    }

    #[test]
    fn test_factors_stay_finite_and_non_negative() {
        let mut model = Mnmf::new(small());
        model.fit(&karate_club()).unwrap();
        let state = model.state.as_ref().unwrap();
        for m in [&state.m, &state.u, &state.h, &state.c] {
            assert!(m.iter().all(|&x| x >= 0.0 && x.is_finite()));
        }
    }

    #[test]
    fn test_modularity_matrix() {
        let g = Graph::from_edges([(0, 1), (1, 2)]);
        let b = modularity_matrix(&g);
        // degrees 1, 2, 1; 2m = 4
        assert_eq!(b[[0, 1]], 0.5);
        assert_eq!(b[[2, 1]], 0.5);
        assert_eq!(b[[0, 2]], 0.0);
    }

    #[test]
    fn test_cluster_centers_need_fit() {
        assert!(Mnmf::default().cluster_centers().is_err());
    }
}
