//! Platt scaling of decision values into probabilities
//!
//! Fits `P(y = 1 | f) = 1 / (1 + exp(A * f + B))` by Newton's method with
//! backtracking line search, using regularized targets so that separable
//! data does not drive the parameters to infinity.

use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

/// Fitted sigmoid parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit the sigmoid to decision values and their true labels
    pub fn fit(decision_values: &[f64], labels: &[u8]) -> Self {
        let prior1 = labels.iter().filter(|&&l| l == 1).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&l| if l == 1 { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decision_values, &targets, a, b);

        let mut converged = false;
        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);

            for (&f, &t) in decision_values.iter().zip(&targets) {
                let (p, q) = split_sigmoid(f * a + b);
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                converged = true;
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let (new_a, new_b) = (a + step * da, b + step * db);
                let new_f = objective(decision_values, &targets, new_a, new_b);
                if new_f < fval + 0.0001 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                warn!("Platt scaling line search failed");
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(max_iter = MAX_ITER, "Platt scaling reached the iteration limit");
        }

        Self { a, b }
    }

    /// Probability of label 1 for one decision value
    pub fn probability(&self, decision_value: f64) -> f64 {
        split_sigmoid(decision_value * self.a + self.b).0
    }
}

/// Numerically stable (1 / (1 + e^z), e^z / (1 + e^z))
fn split_sigmoid(z: f64) -> (f64, f64) {
    if z >= 0.0 {
        let e = (-z).exp();
        (e / (1.0 + e), 1.0 / (1.0 + e))
    } else {
        let e = z.exp();
        (1.0 / (1.0 + e), e / (1.0 + e))
    }
}

/// Negative log-likelihood of the targets
fn objective(decision_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decision_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let z = f * a + b;
            if z >= 0.0 {
                t * z + (-z).exp().ln_1p()
            } else {
                (t - 1.0) * z + z.exp().ln_1p()
            }
        })
        .sum()
}
