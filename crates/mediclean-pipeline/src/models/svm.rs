//! RBF-kernel support vector classifier (classifier B)
//!
//! The dual problem is solved by sequential minimal optimization with
//! second-order working set selection. Kernel rows are evaluated on demand
//! through a bounded cache.
//! Probabilities come from Platt scaling fitted on cross-validated decision
//! values; hard predictions use the sign of the decision function.

use super::calibration::PlattScaling;
use super::kernel::{kernel_expansion, KernelCache};
use super::{check_training_set, check_width, BinaryClassifier};
use crate::config::SvmConfig;
use mediclean_core::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Floor for a non-positive curvature along the update direction
const TAU: f64 = 1e-12;

/// Support vectors and offsets of one solved dual problem
#[derive(Debug, Clone)]
struct DualSolution {
    support: Array2<f64>,
    /// alpha_i * y_i per support vector
    coef: Array1<f64>,
    rho: f64,
    iterations: usize,
}

impl DualSolution {
    fn decision(&self, x: &Array2<f64>, gamma: f64) -> Array1<f64> {
        if self.coef.is_empty() {
            return Array1::from_elem(x.nrows(), -self.rho);
        }
        kernel_expansion(x, &self.support, &self.coef, gamma) - self.rho
    }
}

/// C-SVC with an RBF kernel
#[derive(Debug, Clone)]
pub struct SupportVectorClassifier {
    config: SvmConfig,
    gamma: f64,
    n_features: usize,
    solution: Option<DualSolution>,
    platt: Option<PlattScaling>,
}

impl SupportVectorClassifier {
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            gamma: 0.0,
            n_features: 0,
            solution: None,
            platt: None,
        }
    }

    /// Kernel width in effect after fitting
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn n_support(&self) -> usize {
        self.solution.as_ref().map_or(0, |s| s.coef.len())
    }

    pub fn platt(&self) -> Option<&PlattScaling> {
        self.platt.as_ref()
    }

    /// Signed distance-like score; positive means label 1
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let solution = self
            .solution
            .as_ref()
            .ok_or_else(|| Error::model("support vector classifier has not been fitted"))?;
        check_width(x, self.n_features, self.name())?;
        Ok(solution.decision(x, self.gamma))
    }

    /// Decision values for every row, each predicted by a model that did not see it
    fn cross_validated_decisions(&self, x: &Array2<f64>, y: &Array1<u8>) -> Vec<f64> {
        let n = y.len();
        let folds = self.config.calibration_folds;

        if folds < 2 || n < folds {
            debug!(
                samples = n,
                folds,
                "Too few samples to cross-validate; calibrating in-sample"
            );
            return self
                .solution
                .as_ref()
                .map(|s| s.decision(x, self.gamma).to_vec())
                .unwrap_or_else(|| vec![0.0; n]);
        }

        let mut permutation: Vec<usize> = (0..n).collect();
        permutation.shuffle(&mut ChaCha8Rng::seed_from_u64(self.config.seed));

        let mut decisions = vec![0.0; n];
        for fold in 0..folds {
            let (begin, end) = (fold * n / folds, (fold + 1) * n / folds);
            let held_out = &permutation[begin..end];
            let train: Vec<usize> = permutation[..begin]
                .iter()
                .chain(&permutation[end..])
                .copied()
                .collect();

            let y_train = y.select(Axis(0), &train);
            let positives = y_train.iter().filter(|&&l| l == 1).count();

            // A fold without both classes votes for whichever class it has
            let constant = if positives == y_train.len() {
                Some(1.0)
            } else if positives == 0 {
                Some(-1.0)
            } else {
                None
            };

            let fold_values = match constant {
                Some(value) => Array1::from_elem(held_out.len(), value),
                None => {
                    let x_train = x.select(Axis(0), &train);
                    let solution = solve(&x_train, &y_train, &self.config, self.gamma);
                    solution.decision(&x.select(Axis(0), held_out), self.gamma)
                }
            };

            for (&row, &value) in held_out.iter().zip(fold_values.iter()) {
                decisions[row] = value;
            }
        }

        decisions
    }
}

impl Default for SupportVectorClassifier {
    fn default() -> Self {
        Self::new(SvmConfig::default())
    }
}

impl BinaryClassifier for SupportVectorClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()> {
        check_training_set(x, y, self.name())?;

        self.n_features = x.ncols();
        self.gamma = self.config.gamma.unwrap_or_else(|| scale_gamma(x));

        let solution = solve(x, y, &self.config, self.gamma);
        debug!(
            support_vectors = solution.coef.len(),
            iterations = solution.iterations,
            gamma = self.gamma,
            rho = solution.rho,
            "Fitted support vector classifier"
        );
        self.solution = Some(solution);

        self.platt = if self.config.probability {
            let decisions = self.cross_validated_decisions(x, y);
            let labels: Vec<u8> = y.to_vec();
            Some(PlattScaling::fit(&decisions, &labels))
        } else {
            None
        };

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        Ok(self.decision_function(x)?.mapv(|f| u8::from(f > 0.0)))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let platt = self.platt.as_ref().ok_or_else(|| {
            Error::model("probability estimates require fitting with probability enabled")
        })?;
        Ok(self.decision_function(x)?.mapv(|f| platt.probability(f)))
    }

    fn name(&self) -> &str {
        "svm"
    }
}

/// 1 / (n_features * Var(X)), or 1 when the features have no spread
fn scale_gamma(x: &Array2<f64>) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    let variance = x.var(0.0);
    if variance > 0.0 {
        1.0 / (x.ncols() as f64 * variance)
    } else {
        1.0
    }
}

/// Sequential minimal optimization of the C-SVC dual
fn solve(x: &Array2<f64>, labels: &Array1<u8>, config: &SvmConfig, gamma: f64) -> DualSolution {
    let n = labels.len();
    let c = config.c;
    let y: Vec<f64> = labels.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
    let mut kernel = KernelCache::new(x, gamma, config.cache_size_mb.saturating_mul(1 << 20));

    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];

    let at_upper = |a: f64| a >= c;
    let at_lower = |a: f64| a <= 0.0;

    let mut iterations = 0usize;
    loop {
        if iterations >= config.max_iter {
            warn!(max_iter = config.max_iter, "SVM solver reached the iteration limit");
            break;
        }

        let Some((i, j)) =
            select_working_set(&y, &alpha, &grad, &mut kernel, c, config.tolerance)
        else {
            break;
        };
        iterations += 1;

        let (row_i, row_j) = (kernel.row(i), kernel.row(j));
        let (k_ii, k_jj) = (kernel.diagonal(i), kernel.diagonal(j));
        let (old_ai, old_aj) = (alpha[i], alpha[j]);

        if y[i] != y[j] {
            let curvature = positive_or_tau(k_ii + k_jj + 2.0 * y[i] * y[j] * row_i[j]);
            let delta = (-grad[i] - grad[j]) / curvature;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let curvature = positive_or_tau(k_ii + k_jj - 2.0 * y[i] * y[j] * row_i[j]);
            let delta = (grad[i] - grad[j]) / curvature;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (delta_i, delta_j) = (alpha[i] - old_ai, alpha[j] - old_aj);
        for (k, g) in grad.iter_mut().enumerate() {
            *g += y[k] * (y[i] * row_i[k] * delta_i + y[j] * row_j[k] * delta_j);
        }
    }

    // Offset: mean over free vectors, else the midpoint of the feasible interval
    let (mut upper, mut lower) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut free, mut free_sum) = (0usize, 0.0);
    for k in 0..n {
        let yg = y[k] * grad[k];
        if at_upper(alpha[k]) {
            if y[k] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if at_lower(alpha[k]) {
            if y[k] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free += 1;
            free_sum += yg;
        }
    }
    let rho = if free > 0 {
        free_sum / free as f64
    } else {
        (upper + lower) / 2.0
    };

    let support: Vec<usize> = (0..n).filter(|&k| alpha[k] > 0.0).collect();
    DualSolution {
        support: x.select(Axis(0), &support),
        coef: support.iter().map(|&k| alpha[k] * y[k]).collect(),
        rho,
        iterations,
    }
}

fn positive_or_tau(curvature: f64) -> f64 {
    if curvature > 0.0 {
        curvature
    } else {
        TAU
    }
}

/// Maximal violating `i`, then the `j` giving the largest second-order decrease
///
/// Returns `None` once the KKT violation drops below `tolerance`.
fn select_working_set(
    y: &[f64],
    alpha: &[f64],
    grad: &[f64],
    kernel: &mut KernelCache<'_>,
    c: f64,
    tolerance: f64,
) -> Option<(usize, usize)> {
    let mut g_max = f64::NEG_INFINITY;
    let mut i_sel = None;

    for t in 0..y.len() {
        let candidate = if y[t] > 0.0 {
            (alpha[t] < c).then(|| -grad[t])
        } else {
            (alpha[t] > 0.0).then(|| grad[t])
        };
        if let Some(value) = candidate {
            if value >= g_max {
                g_max = value;
                i_sel = Some(t);
            }
        }
    }
    let i = i_sel?;
    let row_i = kernel.row(i);
    let k_ii = kernel.diagonal(i);

    let mut g_max2 = f64::NEG_INFINITY;
    let mut j_sel = None;
    let mut best_decrease = f64::INFINITY;

    for t in 0..y.len() {
        let (violation, grad_diff) = if y[t] > 0.0 {
            if alpha[t] <= 0.0 {
                continue;
            }
            (grad[t], g_max + grad[t])
        } else {
            if alpha[t] >= c {
                continue;
            }
            (-grad[t], g_max - grad[t])
        };

        g_max2 = g_max2.max(violation);
        if grad_diff > 0.0 {
            let curvature = positive_or_tau(k_ii + kernel.diagonal(t) - 2.0 * row_i[t]);
            let decrease = -(grad_diff * grad_diff) / curvature;
            if decrease <= best_decrease {
                best_decrease = decrease;
                j_sel = Some(t);
            }
        }
    }

    if g_max + g_max2 < tolerance {
        return None;
    }
    j_sel.map(|j| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn clusters() -> (Array2<f64>, Array1<u8>) {
        let x = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.2, 0.1],
            [0.1, 0.2],
            [0.0, 0.0],
            [0.9, 1.0],
            [1.0, 0.9],
            [0.8, 0.9],
            [0.9, 0.8],
            [1.0, 1.0],
        ];
        let y = array![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_svm_separates_clusters() {
        let (x, y) = clusters();
        let mut svm = SupportVectorClassifier::default();
        svm.fit(&x, &y).unwrap();

        assert!(svm.n_support() > 0);
        assert_eq!(svm.predict(&x).unwrap(), y);

        let decisions = svm.decision_function(&array![[0.05, 0.05], [0.95, 0.95]]).unwrap();
        assert!(decisions[0] < 0.0);
        assert!(decisions[1] > 0.0);
    }

    #[test]
    fn test_probabilities_follow_decisions() {
        let (x, y) = clusters();
        let mut svm = SupportVectorClassifier::default();
        svm.fit(&x, &y).unwrap();

        let proba = svm.predict_proba(&array![[0.0, 0.0], [1.0, 1.0]]).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(proba[1] > proba[0]);
    }

    #[test]
    fn test_scale_gamma() {
        let x = array![[0.0, 2.0], [0.0, 2.0]];
        assert_eq!(scale_gamma(&x), 1.0 / (2.0 * 1.0));

        let flat = array![[3.0, 3.0]];
        assert_eq!(scale_gamma(&flat), 1.0);
    }

    #[test]
    fn test_small_kernel_cache_gives_same_model() {
        let (x, y) = clusters();
        let mut roomy = SupportVectorClassifier::default();
        roomy.fit(&x, &y).unwrap();

        // A zero budget still keeps the two rows each update needs
        let mut tight = SupportVectorClassifier::new(SvmConfig {
            cache_size_mb: 0,
            ..Default::default()
        });
        tight.fit(&x, &y).unwrap();

        assert_eq!(tight.n_support(), roomy.n_support());
        let probe = array![[0.05, 0.05], [0.5, 0.5], [0.95, 0.95]];
        let a = roomy.decision_function(&probe).unwrap();
        let b = tight.decision_function(&probe).unwrap();
        for (u, v) in a.iter().zip(b.iter()) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_class_is_model_error() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0, 0, 0];
        let err = SupportVectorClassifier::default().fit(&x, &y).unwrap_err();
        assert_eq!(err.kind(), "model_error");
        assert!(err.to_string().contains("single class"));
    }

    #[test]
    fn test_proba_without_calibration_errors() {
        let (x, y) = clusters();
        let mut svm = SupportVectorClassifier::new(SvmConfig {
            probability: false,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();
        assert!(svm.predict_proba(&x).is_err());
        assert!(svm.predict(&x).is_ok());
    }
}
