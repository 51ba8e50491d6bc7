//! Descriptive statistics over one channel of a window
//!
//! All moments are population (biased) estimates. Quantities that divide
//! by the variance return NaN for constant input instead of failing.

/// Arithmetic mean, NaN for empty input
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance, NaN for empty input
pub fn variance(data: &[f64]) -> f64 {
    central_moment(data, 2)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

fn central_moment(data: &[f64], order: i32) -> f64 {
    let m = mean(data);
    if m.is_nan() {
        return f64::NAN;
    }
    data.iter().map(|x| (x - m).powi(order)).sum::<f64>() / data.len() as f64
}

/// Sample skewness `m3 / m2^1.5`
pub fn skewness(data: &[f64]) -> f64 {
    let m2 = central_moment(data, 2);
    if !(m2 > 0.0) {
        return f64::NAN;
    }
    central_moment(data, 3) / m2.powf(1.5)
}

/// Excess (Fisher) kurtosis `m4 / m2^2 - 3`
pub fn excess_kurtosis(data: &[f64]) -> f64 {
    let m2 = central_moment(data, 2);
    if !(m2 > 0.0) {
        return f64::NAN;
    }
    central_moment(data, 4) / (m2 * m2) - 3.0
}

/// Peak-to-peak range `max - min`
pub fn peak_to_peak(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    max - min
}

/// Percentile of already sorted data with linear interpolation between ranks
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Interquartile range `q75 - q25`
pub fn interquartile_range(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, 75.0) - percentile_sorted(&sorted, 25.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_moments_known_values() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&data) - 5.0).abs() < EPS);
        assert!((variance(&data) - 4.0).abs() < EPS);
        assert!((std_dev(&data) - 2.0).abs() < EPS);
        assert!((peak_to_peak(&data) - 7.0).abs() < EPS);
    }

    #[test]
    fn test_skewness_sign() {
        let right_tail = [1.0, 1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&right_tail) > 0.0);
        let symmetric = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(skewness(&symmetric).abs() < EPS);
    }

    #[test]
    fn test_excess_kurtosis_uniform_pair() {
        // Two-point symmetric distribution: m4 / m2^2 = 1
        let data = [-1.0, 1.0, -1.0, 1.0];
        assert!((excess_kurtosis(&data) + 2.0).abs() < EPS);
    }

    #[test]
    fn test_constant_input_indeterminate_shape() {
        let data = [3.0; 16];
        assert_eq!(variance(&data), 0.0);
        assert!(skewness(&data).is_nan());
        assert!(excess_kurtosis(&data).is_nan());
        assert_eq!(peak_to_peak(&data), 0.0);
        assert_eq!(interquartile_range(&data), 0.0);
    }

    #[test]
    fn test_interquartile_range_interpolates() {
        // q25 at rank 0.75 -> 1.75, q75 at rank 2.25 -> 3.25
        let data = [4.0, 1.0, 3.0, 2.0];
        assert!((interquartile_range(&data) - 1.5).abs() < EPS);
    }

    #[test]
    fn test_empty_input() {
        assert!(mean(&[]).is_nan());
        assert!(variance(&[]).is_nan());
        assert!(peak_to_peak(&[]).is_nan());
    }
}
