//! Deep autoencoder-like NMF (DANMF).
//!
//! Ye, Chen & Zheng, "Deep Autoencoder-like Nonnegative Matrix Factorization
//! for Community Detection" (CIKM 2018).
//!
//! The adjacency matrix is decoded through a stack of factors,
//! `A ≈ U_1 U_2 ... U_p V_p`, and encoded back, `V_p ≈ U_pᵀ ... U_1ᵀ A`, with a
//! graph-Laplacian smoothness term `λ tr(V_p L V_pᵀ)`.
//!
//! # Training
//!
//! 1. **Pre-training**: layer `i` factorizes the previous layer's `V`
//!    (starting from `A`) with plain NMF.
//! 2. **Joint updates**: per iteration and layer, multiplicative updates of
//!    `U_i`, the running product `P = U_1 ... U_i`, and `V_i`.
//!
//! Memberships are the argmax of `P = U_1 ... U_p`; the embedding is
//! `[P, V_pᵀ]`.

use crate::nmf::Nmf;
use grapple_core::estimator::fitted;
use grapple_core::{
    CommunityDetection, Error, Estimator, Graph, Memberships, NodeEmbedding, Result,
};
use ndarray::{concatenate, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lower bound for update denominators.
const FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DanmfConfig {
    /// Layer widths, outermost first; the last is the community count.
    pub layers: Vec<usize>,
    /// NMF iterations per layer during pre-training.
    pub pre_iterations: usize,
    /// Joint update iterations.
    pub iterations: usize,
    /// Laplacian regularization weight.
    pub lamb: f64,
    pub seed: u64,
}

impl Default for DanmfConfig {
    fn default() -> Self {
        Self {
            layers: vec![32, 8],
            pre_iterations: 100,
            iterations: 100,
            lamb: 0.01,
            seed: 42,
        }
    }
}

impl DanmfConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidParameter("layers must not be empty".into()));
        }
        if self.layers.contains(&0) {
            return Err(Error::InvalidParameter("layer widths must be positive".into()));
        }
        if !(self.lamb.is_finite() && self.lamb >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "lamb must be non-negative, got {}",
                self.lamb
            )));
        }
        Ok(())
    }
}

/// `target ⊙ numerator / max(denominator, FLOOR)`.
fn update(target: &mut Array2<f64>, numerator: &Array2<f64>, denominator: &Array2<f64>) {
    Zip::from(target)
        .and(numerator)
        .and(denominator)
        .for_each(|t, &n, &d| *t *= n / d.max(FLOOR));
}

/// Matrices shared by every update.
struct Problem {
    a: Array2<f64>,
    a_sq: Array2<f64>,
    degree: Array2<f64>,
    lamb: f64,
}

/// Fitted factors.
#[derive(Debug, Clone)]
struct Factors {
    u: Vec<Array2<f64>>,
    v: Vec<Array2<f64>>,
    p: Array2<f64>,
}

impl Factors {
    fn pretrain(a: &Array2<f64>, config: &DanmfConfig) -> Result<Self> {
        let mut u = Vec::with_capacity(config.layers.len());
        let mut v: Vec<Array2<f64>> = Vec::with_capacity(config.layers.len());
        for (i, &width) in config.layers.iter().enumerate() {
            let target = if i == 0 { a } else { &v[i - 1] };
            let (ui, vi) = Nmf::new(width, config.pre_iterations, config.seed).fit(target)?;
            debug!(layer = i, width, "DANMF layer pre-trained");
            u.push(ui);
            v.push(vi);
        }
        let p = u[0].clone();
        Ok(Self { u, v, p })
    }

    /// `Q_i = U_i U_{i+1} ... U_p`, with `Q_{p+1} = I`.
    fn q_products(&self) -> Vec<Array2<f64>> {
        let depth = self.u.len();
        let last = self.u[depth - 1].ncols();
        let mut q = vec![Array2::eye(last); depth + 1];
        for i in (0..depth).rev() {
            q[i] = self.u[i].dot(&q[i + 1]);
        }
        q
    }

    fn update_u(
        &mut self,
        i: usize,
        q_next: &Array2<f64>,
        vp_vpt: &Array2<f64>,
        problem: &Problem,
    ) {
        let vp = &self.v[self.u.len() - 1];
        let q_qt = q_next.dot(&q_next.t());
        let (numerator, denominator) = if i == 0 {
            let u0 = &self.u[0];
            let r = u0.dot(&q_next.dot(vp_vpt).dot(&q_next.t()))
                + problem.a_sq.dot(&u0.dot(&q_qt));
            let ru = problem.a.dot(&vp.t().dot(&q_next.t())) * 2.0;
            (ru, r)
        } else {
            let ui = &self.u[i];
            let ptp = self.p.t().dot(&self.p);
            let r = ptp.dot(ui).dot(q_next).dot(vp_vpt).dot(&q_next.t())
                + problem.a_sq.dot(&self.p).t().dot(&self.p).dot(ui).dot(&q_qt);
            let ru = problem.a.dot(&self.p).t().dot(&vp.t()).dot(&q_next.t()) * 2.0;
            (ru, r)
        };
        update(&mut self.u[i], &numerator, &denominator);
    }

    fn update_p(&mut self, i: usize) {
        self.p = if i == 0 {
            self.u[0].clone()
        } else {
            self.p.dot(&self.u[i])
        };
    }

    fn update_v(&mut self, i: usize, problem: &Problem) {
        let ap_t = problem.a.dot(&self.p).t().to_owned() * 2.0;
        let vi = &self.v[i];
        let base = self.p.t().dot(&self.p).dot(vi) + vi;
        let (numerator, denominator) = if i + 1 < self.u.len() {
            (ap_t, base)
        } else {
            // A and D are symmetric: (A Vᵀ)ᵀ = V A
            (
                ap_t + vi.dot(&problem.a) * problem.lamb,
                base + vi.dot(&problem.degree) * problem.lamb,
            )
        };
        update(&mut self.v[i], &numerator, &denominator);
    }
}

/// DANMF community detection.
#[derive(Debug, Clone, Default)]
pub struct Danmf {
    config: DanmfConfig,
    factors: Option<Factors>,
}

impl Danmf {
    pub fn new(config: DanmfConfig) -> Self {
        Self {
            config,
            factors: None,
        }
    }

    pub fn config(&self) -> &DanmfConfig {
        &self.config
    }
}

impl Estimator for Danmf {
    const NAME: &'static str = "DANMF";

    fn fit(&mut self, graph: &Graph) -> Result<()> {
        self.config.validate()?;
        graph.validate()?;

        let a = graph.adjacency_matrix();
        let problem = Problem {
            a_sq: a.dot(&a.t()),
            degree: graph.degree_matrix(),
            lamb: self.config.lamb,
            a,
        };

        let mut factors = Factors::pretrain(&problem.a, &self.config)?;
        let depth = self.config.layers.len();
        for iteration in 0..self.config.iterations {
            let q = factors.q_products();
            let vp = &factors.v[depth - 1];
            let vp_vpt = vp.dot(&vp.t());
            for i in 0..depth {
                factors.update_u(i, &q[i + 1], &vp_vpt, &problem);
                factors.update_p(i);
                factors.update_v(i, &problem);
            }
            debug!(iteration, "DANMF joint update");
        }

        info!(
            nodes = graph.node_count(),
            layers = ?self.config.layers,
            "DANMF fitted"
        );
        self.factors = Some(factors);
        Ok(())
    }
}

impl NodeEmbedding for Danmf {
    /// `[P, V_pᵀ]`, width twice the last layer.
    fn embedding(&self) -> Result<Array2<f64>> {
        let factors = fitted(&self.factors, Self::NAME)?;
        let vp_t = factors.v[factors.v.len() - 1].t();
        concatenate(Axis(1), &[factors.p.view(), vp_t])
            .map_err(|e| Error::InvalidParameter(format!("concatenating factors: {e}")))
    }
}

impl CommunityDetection for Danmf {
    fn memberships(&self) -> Result<Memberships> {
        let factors = fitted(&self.factors, Self::NAME)?;
        Ok(Memberships::from_argmax(&factors.p))
    }
}
