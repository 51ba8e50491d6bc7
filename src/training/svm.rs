//! RBF-kernel support vector machine
//!
//! Binary problems are solved with sequential minimal optimisation on the
//! dual, choosing the maximal violating pair at each step. Multiclass
//! prediction is one-vs-one voting over every class pair.
//!
//! # Reference
//!
//! Fan, R.-E., Chen, P.-H., & Lin, C.-J. (2005). Working set selection using
//! second order information for training support vector machines.
//! *Journal of Machine Learning Research*, 6, 1889-1918.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Gamma;
use crate::error::{PipelineError, Result};

/// Stopping tolerance on the maximal KKT violation
const TOLERANCE: f64 = 1e-3;

/// Floor for a non-positive curvature along the working pair
const TAU: f64 = 1e-12;

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * d2).exp()
}

/// `1 / (n_features * var(X))` over every entry of the training matrix
pub fn scale_gamma(rows: &[Vec<f64>]) -> f64 {
    let n_features = rows.first().map_or(0, Vec::len);
    let count = (rows.len() * n_features) as f64;
    if count == 0.0 {
        return 1.0;
    }
    let mean = rows.iter().flatten().sum::<f64>() / count;
    let var = rows.iter().flatten().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    if var > 0.0 {
        1.0 / (n_features as f64 * var)
    } else {
        1.0
    }
}

/// Decision function for one class pair
///
/// Positive decision values vote for `positive`, the rest for `negative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BinarySvm {
    positive: u8,
    negative: u8,
    support: Vec<Vec<f64>>,
    /// `alpha_i * y_i` per support vector
    coef: Vec<f64>,
    rho: f64,
}

impl BinarySvm {
    fn decision(&self, row: &[f64], gamma: f64) -> f64 {
        self.support
            .iter()
            .zip(&self.coef)
            .map(|(sv, &c)| c * rbf(sv, row, gamma))
            .sum::<f64>()
            - self.rho
    }
}

/// Multiclass RBF SVM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmClassifier {
    gamma: f64,
    c: f64,
    classes: Vec<u8>,
    n_features: usize,
    machines: Vec<BinarySvm>,
}

impl SvmClassifier {
    /// Fit one binary machine per class pair
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty training data or a non-positive `c`.
    pub fn fit(rows: &[Vec<f64>], labels: &[u8], c: f64, gamma: Gamma) -> Result<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(PipelineError::InvalidInput(
                "SVM needs one label per non-empty training row".to_string(),
            ));
        }
        if !(c > 0.0) {
            return Err(PipelineError::InvalidInput(format!(
                "SVM box constraint must be positive, got {}",
                c
            )));
        }

        let gamma = match gamma {
            Gamma::Scale => scale_gamma(rows),
            Gamma::Value(g) => g,
        };

        let mut classes: Vec<u8> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let pairs: Vec<(u8, u8)> = classes
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| classes[i + 1..].iter().map(move |&b| (a, b)))
            .collect();

        let machines = pairs
            .par_iter()
            .map(|&(a, b)| {
                let idx: Vec<usize> = (0..labels.len())
                    .filter(|&i| labels[i] == a || labels[i] == b)
                    .collect();
                let x: Vec<&[f64]> = idx.iter().map(|&i| rows[i].as_slice()).collect();
                let y: Vec<f64> = idx
                    .iter()
                    .map(|&i| if labels[i] == a { 1.0 } else { -1.0 })
                    .collect();
                train_binary(&x, &y, c, gamma, a, b)
            })
            .collect();

        Ok(Self {
            gamma,
            c,
            classes,
            n_features: rows[0].len(),
            machines,
        })
    }

    /// Kernel width in use
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Expected row length
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Total support vectors across all pair machines
    pub fn n_support(&self) -> usize {
        self.machines.iter().map(|m| m.support.len()).sum()
    }

    /// One-vs-one vote; ties go to the smallest label
    pub fn predict(&self, row: &[f64]) -> u8 {
        let mut votes = vec![0usize; self.classes.len()];
        for machine in &self.machines {
            let winner = if machine.decision(row, self.gamma) > 0.0 {
                machine.positive
            } else {
                machine.negative
            };
            if let Ok(pos) = self.classes.binary_search(&winner) {
                votes[pos] += 1;
            }
        }

        let mut best = 0;
        for (i, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

/// Solve one binary dual problem and keep the support vectors
fn train_binary(x: &[&[f64]], y: &[f64], c: f64, gamma: f64, positive: u8, negative: u8) -> BinarySvm {
    let n = x.len();
    let kernel: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| rbf(x[i], x[j], gamma)).collect())
        .collect();
    let q = |i: usize, j: usize| y[i] * y[j] * kernel[i][j];

    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let max_iter = (100 * n).max(100_000);
    let mut iter = 0;

    let in_up = |a: f64, yi: f64| (yi > 0.0 && a < c) || (yi < 0.0 && a > 0.0);
    let in_low = |a: f64, yi: f64| (yi > 0.0 && a > 0.0) || (yi < 0.0 && a < c);

    loop {
        let mut i_best = None;
        let mut g_max = f64::NEG_INFINITY;
        let mut j_best = None;
        let mut g_min = f64::INFINITY;
        for t in 0..n {
            let v = -y[t] * grad[t];
            if in_up(alpha[t], y[t]) && v > g_max {
                g_max = v;
                i_best = Some(t);
            }
            if in_low(alpha[t], y[t]) && v < g_min {
                g_min = v;
                j_best = Some(t);
            }
        }

        let (i, j) = match (i_best, j_best) {
            (Some(i), Some(j)) if g_max - g_min >= TOLERANCE => (i, j),
            _ => break,
        };

        if iter >= max_iter {
            log::warn!(
                "SVM {} vs {}: reached {} iterations before convergence",
                positive,
                negative,
                max_iter
            );
            break;
        }
        iter += 1;

        let (old_i, old_j) = (alpha[i], alpha[j]);

        if y[i] != y[j] {
            let quad = (q(i, i) + q(j, j) + 2.0 * q(i, j)).max(TAU);
            let delta = (-grad[i] - grad[j]) / quad;
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
            let quad = (q(i, i) + q(j, j) - 2.0 * q(i, j)).max(TAU);
            let delta = (grad[i] - grad[j]) / quad;
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

        let (di, dj) = (alpha[i] - old_i, alpha[j] - old_j);
        for t in 0..n {
            grad[t] += q(t, i) * di + q(t, j) * dj;
        }
    }

    let rho = compute_rho(&alpha, &grad, y, c);

    let mut support = Vec::new();
    let mut coef = Vec::new();
    for t in 0..n {
        if alpha[t] > 0.0 {
            support.push(x[t].to_vec());
            coef.push(alpha[t] * y[t]);
        }
    }

    log::debug!(
        "SVM {} vs {}: {} iterations, {} support vectors",
        positive,
        negative,
        iter,
        support.len()
    );

    BinarySvm {
        positive,
        negative,
        support,
        coef,
        rho,
    }
}

/// Bias from free variables, or the midpoint of the feasible interval
fn compute_rho(alpha: &[f64], grad: &[f64], y: &[f64], c: f64) -> f64 {
    let mut ub = f64::INFINITY;
    let mut lb = f64::NEG_INFINITY;
    let mut free = 0usize;
    let mut sum_free = 0.0;

    for t in 0..alpha.len() {
        let yg = y[t] * grad[t];
        if alpha[t] >= c {
            if y[t] < 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else if alpha[t] <= 0.0 {
            if y[t] > 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else {
            free += 1;
            sum_free += yg;
        }
    }

    if free > 0 {
        sum_free / free as f64
    } else {
        (ub + lb) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<u8>) {
        let centres = [(-3.0, -3.0), (3.0, 3.0), (3.0, -3.0)];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (label, &(cx, cy)) in centres.iter().enumerate() {
            for k in 0..12 {
                let angle = k as f64 * 0.52;
                let r = 0.3 + 0.05 * k as f64;
                rows.push(vec![cx + r * angle.cos(), cy + r * angle.sin()]);
                labels.push(label as u8);
            }
        }
        (rows, labels)
    }

    #[test]
    fn test_separable_blobs() {
        let (rows, labels) = blobs();
        let svm = SvmClassifier::fit(&rows, &labels, 10.0, Gamma::Scale).unwrap();
        for (row, &label) in rows.iter().zip(&labels) {
            assert_eq!(svm.predict(row), label);
        }
        assert_eq!(svm.predict(&[-2.5, -3.2]), 0);
        assert_eq!(svm.predict(&[3.3, 2.8]), 1);
        assert_eq!(svm.predict(&[2.9, -3.1]), 2);
        assert!(svm.n_support() > 0);
    }

    #[test]
    fn test_xor_needs_kernel() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ];
        let labels = vec![0, 0, 1, 1];
        let svm = SvmClassifier::fit(&rows, &labels, 10.0, Gamma::Value(2.0)).unwrap();
        for (row, &label) in rows.iter().zip(&labels) {
            assert_eq!(svm.predict(row), label);
        }
    }

    #[test]
    fn test_scale_gamma() {
        // Entries {0, 2, 0, 2}: variance 1, two features
        let rows = vec![vec![0.0, 2.0], vec![0.0, 2.0]];
        assert!((scale_gamma(&rows) - 0.5).abs() < 1e-12);
        assert_eq!(scale_gamma(&[vec![1.0, 1.0]]), 1.0);
    }

    #[test]
    fn test_single_class_predicts_it() {
        let svm = SvmClassifier::fit(&[vec![0.0], vec![1.0]], &[3, 3], 1.0, Gamma::Scale).unwrap();
        assert_eq!(svm.predict(&[5.0]), 3);
    }
}
