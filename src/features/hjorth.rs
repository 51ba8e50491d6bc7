//! Hjorth mobility and complexity
//!
//! mobility = sqrt(var(x') / var(x))
//! complexity = sqrt(var(x'') / var(x')) / mobility
//!
//! Derivatives are first-order finite differences. Zero variances make the
//! ratios undefined; those propagate as NaN.

use super::statistics::variance;

/// Hjorth descriptors of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HjorthParameters {
    /// Mean frequency proxy
    pub mobility: f64,
    /// Deviation from a pure sine
    pub complexity: f64,
}

fn diff(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// Compute Hjorth mobility and complexity
pub fn hjorth_parameters(data: &[f64]) -> HjorthParameters {
    let d1 = diff(data);
    let d2 = diff(&d1);

    let var0 = variance(data);
    let var1 = variance(&d1);
    let var2 = variance(&d2);

    let mobility = ratio(var1, var0).sqrt();
    let complexity = ratio(ratio(var2, var1).sqrt(), mobility);

    HjorthParameters {
        mobility,
        complexity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pure_sine_complexity_near_one() {
        let fs = 128.0;
        let data: Vec<f64> = (0..512)
            .map(|i| (2.0 * PI * 4.0 * i as f64 / fs).sin())
            .collect();
        let h = hjorth_parameters(&data);

        // Mobility of a sampled sine is 2 sin(pi f / fs)
        let expected = 2.0 * (PI * 4.0 / fs).sin();
        assert!((h.mobility - expected).abs() < 0.01, "mobility {:.4}", h.mobility);
        assert!((h.complexity - 1.0).abs() < 0.05, "complexity {:.4}", h.complexity);
    }

    #[test]
    fn test_constant_is_nan() {
        let h = hjorth_parameters(&[2.0; 32]);
        assert!(h.mobility.is_nan());
        assert!(h.complexity.is_nan());
    }

    #[test]
    fn test_linear_ramp_complexity_undefined() {
        let data: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let h = hjorth_parameters(&data);
        assert_eq!(h.mobility, 0.0);
        assert!(h.complexity.is_nan());
    }
}
