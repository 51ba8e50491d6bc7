//! Welch power spectral density and band power
//!
//! Algorithm:
//! 1. Split the signal into segments of `nperseg` samples with 50% overlap
//! 2. Remove each segment's mean and apply a periodic Hann window
//! 3. FFT each segment, keep the one-sided density `|X|^2 / (fs * sum(w^2))`
//!    (doubled for every bin except DC and Nyquist)
//! 4. Average the segment periodograms
//!
//! Band power is the trapezoidal integral of the PSD over the bins that
//! fall inside the band edges (inclusive).

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{PipelineError, Result};

/// One-sided power spectral density
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    /// Bin centre frequencies in Hz
    pub freqs: Vec<f64>,
    /// Density in units² / Hz
    pub density: Vec<f64>,
}

impl PowerSpectrum {
    /// Integrate the density over `[low_hz, high_hz]` with the trapezoidal rule
    ///
    /// Bands covering fewer than two bins integrate to zero.
    pub fn band_power(&self, low_hz: f64, high_hz: f64) -> f64 {
        let (freqs, density): (Vec<f64>, Vec<f64>) = self
            .freqs
            .iter()
            .zip(&self.density)
            .filter(|(&f, _)| f >= low_hz && f <= high_hz)
            .map(|(&f, &p)| (f, p))
            .unzip();

        freqs
            .windows(2)
            .zip(density.windows(2))
            .map(|(f, p)| (f[1] - f[0]) * (p[0] + p[1]) / 2.0)
            .sum()
    }
}

/// Welch PSD estimator with a pre-planned FFT for the nominal segment length
#[derive(Clone)]
pub struct WelchEstimator {
    sample_rate: f64,
    segment_len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for WelchEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WelchEstimator")
            .field("sample_rate", &self.sample_rate)
            .field("segment_len", &self.segment_len)
            .finish()
    }
}

impl WelchEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `segment_len` - Nominal segment length; shorter signals use their own length
    pub fn new(sample_rate: f64, segment_len: usize) -> Self {
        let segment_len = segment_len.max(1);
        let fft = FftPlanner::new().plan_fft_forward(segment_len);
        Self {
            sample_rate,
            segment_len,
            fft,
        }
    }

    /// Estimate the one-sided PSD of a signal
    ///
    /// # Errors
    ///
    /// Returns `NumericIndeterminate` for signals shorter than two samples.
    pub fn psd(&self, signal: &[f64]) -> Result<PowerSpectrum> {
        let n = signal.len();
        if n < 2 {
            return Err(PipelineError::NumericIndeterminate(format!(
                "Welch PSD needs at least 2 samples, got {}",
                n
            )));
        }

        let nperseg = self.segment_len.min(n);
        let fft = if nperseg == self.fft.len() {
            Arc::clone(&self.fft)
        } else {
            FftPlanner::new().plan_fft_forward(nperseg)
        };

        let noverlap = nperseg / 2;
        let step = nperseg - noverlap;
        let n_segments = (n - nperseg) / step + 1;

        let window = periodic_hann(nperseg);
        let scale = 1.0 / (self.sample_rate * window.iter().map(|w| w * w).sum::<f64>());
        let n_bins = nperseg / 2 + 1;

        let mut density = vec![0.0; n_bins];
        let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        for seg in 0..n_segments {
            let segment = &signal[seg * step..seg * step + nperseg];
            let seg_mean = segment.iter().sum::<f64>() / nperseg as f64;

            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                *slot = Complex::new((x - seg_mean) * w, 0.0);
            }

            fft.process_with_scratch(&mut buffer, &mut scratch);

            for (d, c) in density.iter_mut().zip(&buffer[..n_bins]) {
                *d += c.norm_sqr() * scale;
            }
        }

        // One-sided: double everything except DC and (for even lengths) Nyquist
        let last_doubled = if nperseg % 2 == 0 { n_bins - 1 } else { n_bins };
        for d in density.iter_mut().take(last_doubled).skip(1) {
            *d *= 2.0;
        }
        for d in density.iter_mut() {
            *d /= n_segments as f64;
        }

        let freqs = (0..n_bins)
            .map(|k| k as f64 * self.sample_rate / nperseg as f64)
            .collect();

        Ok(PowerSpectrum { freqs, density })
    }
}

/// Periodic Hann window (`sym = false`)
fn periodic_hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, amp: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_sine_power_lands_in_band() {
        let fs = 128.0;
        let welch = WelchEstimator::new(fs, 256);
        let psd = welch.psd(&sine(10.0, 1.0, fs, 192)).unwrap();

        assert_eq!(psd.freqs.len(), 97);
        let alpha = psd.band_power(8.0, 12.0);
        let delta = psd.band_power(1.0, 4.0);
        let total = psd.band_power(0.0, 64.0);

        assert!(alpha > 0.9 * total, "alpha {:.4} of total {:.4}", alpha, total);
        assert!(delta < 0.01 * total);
        // Parseval: a unit sine carries variance 0.5
        assert!((total - 0.5).abs() < 0.05, "total power {:.4}", total);
    }

    #[test]
    fn test_multiple_segments() {
        let fs = 128.0;
        let welch = WelchEstimator::new(fs, 64);
        let psd = welch.psd(&sine(20.0, 2.0, fs, 640)).unwrap();
        assert_eq!(psd.freqs.len(), 33);
        assert!((psd.freqs[1] - 2.0).abs() < 1e-12);
        let beta = psd.band_power(13.0, 30.0);
        assert!((beta - 2.0).abs() < 0.2, "beta power {:.4}", beta);
    }

    #[test]
    fn test_constant_signal_has_zero_power() {
        let welch = WelchEstimator::new(128.0, 256);
        let psd = welch.psd(&[4.0; 192]).unwrap();
        assert!(psd.density.iter().all(|&p| p.abs() < 1e-20));
        assert_eq!(psd.band_power(1.0, 4.0), 0.0);
    }

    #[test]
    fn test_band_power_non_negative() {
        let welch = WelchEstimator::new(128.0, 256);
        let noisy: Vec<f64> = (0..192).map(|i| ((i * 7919) % 101) as f64 - 50.0).collect();
        let psd = welch.psd(&noisy).unwrap();
        for (lo, hi) in [(1.0, 4.0), (4.0, 7.0), (8.0, 12.0), (13.0, 30.0), (30.0, 45.0)] {
            assert!(psd.band_power(lo, hi) >= 0.0);
        }
    }

    #[test]
    fn test_too_short_signal() {
        let welch = WelchEstimator::new(128.0, 256);
        assert!(welch.psd(&[1.0]).is_err());
    }
}
