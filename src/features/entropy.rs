//! Information-theoretic and complexity measures
//!
//! - Shannon entropy of the magnitude distribution
//! - Sample entropy (Richman & Moorman, 2000)

use super::statistics::std_dev;

/// Shannon entropy (natural log) of the normalized magnitude distribution
///
/// Each sample contributes probability mass `|x_i| / sum(|x|)`. Returns NaN
/// when every sample is zero.
pub fn shannon_entropy(data: &[f64]) -> f64 {
    let total: f64 = data.iter().map(|x| x.abs()).sum();
    if !(total > 0.0) {
        return f64::NAN;
    }
    -data
        .iter()
        .map(|x| x.abs() / total)
        .filter(|&p| p > 0.0)
        .map(|p| p * p.ln())
        .sum::<f64>()
}

/// Sample entropy with tolerance `tolerance_ratio * std(data)`
///
/// # Reference
///
/// Richman, J. S., & Moorman, J. R. (2000). Physiological time-series analysis
/// using approximate entropy and sample entropy. *American Journal of
/// Physiology*, 278(6), H2039-H2049.
///
/// Counts template pairs of length `m` (B) and `m + 1` (A) whose Chebyshev
/// distance is strictly below the tolerance, over the same `N - m` starting
/// points and excluding self-matches, then returns `-ln(A / B)`.
///
/// # Returns
///
/// NaN when the tolerance is zero (constant input), when the series is too
/// short, or when no template pair matches (`A == 0` or `B == 0`).
pub fn sample_entropy(data: &[f64], embedding_dim: usize, tolerance_ratio: f64) -> f64 {
    let n = data.len();
    let m = embedding_dim;
    if m == 0 || n <= m + 1 {
        return f64::NAN;
    }

    let tolerance = tolerance_ratio * std_dev(data);
    if !(tolerance > 0.0) {
        return f64::NAN;
    }

    let (matches_m, matches_m1) = template_matches(data, m, tolerance);

    if matches_m == 0 || matches_m1 == 0 {
        return f64::NAN;
    }

    -(matches_m1 as f64 / matches_m as f64).ln()
}

/// Pairs of length-`m` templates closer than `tolerance` (B), and how many
/// of them still match at length `m + 1` (A)
fn template_matches(data: &[f64], m: usize, tolerance: f64) -> (u64, u64) {
    let templates = data.len() - m;
    let mut matches_m: u64 = 0;
    let mut matches_m1: u64 = 0;

    for i in 0..templates {
        for j in (i + 1)..templates {
            let within = (0..m).all(|k| (data[i + k] - data[j + k]).abs() < tolerance);
            if within {
                matches_m += 1;
                if (data[i + m] - data[j + m]).abs() < tolerance {
                    matches_m1 += 1;
                }
            }
        }
    }

    (matches_m, matches_m1)
}
