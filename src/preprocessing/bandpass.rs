//! Butterworth band-pass filtering
//!
//! The filter is designed in zero-pole-gain form:
//! 1. Analog Butterworth low-pass prototype of order N
//! 2. Low-pass to band-pass transform around the prewarped corners
//! 3. Bilinear transform to the z-plane
//!
//! The resulting order-2N filter is realised as N second-order sections
//! run in transposed direct form II with zero initial state. The filter is
//! causal (single forward pass), so it introduces phase distortion.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use crate::config::FilterConfig;
use crate::error::{PipelineError, Result};

/// Imaginary parts below this are treated as real poles when pairing sections
const REAL_POLE_TOLERANCE: f64 = 1e-10;

/// Second-order IIR section
#[derive(Debug, Clone, PartialEq)]
pub struct Biquad {
    /// Numerator coefficients [b0, b1, b2]
    pub b: [f64; 3],
    /// Denominator coefficients [1, a1, a2]
    pub a: [f64; 3],
}

/// Transposed direct form II state for one section
#[derive(Debug, Clone, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

impl BiquadState {
    fn process(&mut self, section: &Biquad, x: f64) -> f64 {
        let y = section.b[0] * x + self.z1;
        self.z1 = section.b[1] * x - section.a[1] * y + self.z2;
        self.z2 = section.b[2] * x - section.a[2] * y;
        y
    }
}

/// Butterworth band-pass filter as a cascade of biquads
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    sections: Vec<Biquad>,
    sample_rate: f64,
}

impl ButterworthBandpass {
    /// Design a band-pass filter
    ///
    /// # Arguments
    ///
    /// * `config` - Corner frequencies and prototype order
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the corners are not strictly inside
    /// `(0, sample_rate / 2)` or the design is unstable.
    pub fn design(config: &FilterConfig, sample_rate: f64) -> Result<Self> {
        let nyquist = sample_rate / 2.0;
        if !(config.low_hz > 0.0 && config.low_hz < config.high_hz && config.high_hz < nyquist) {
            return Err(PipelineError::InvalidInput(format!(
                "band-pass corners {}-{} Hz invalid for sample rate {} Hz",
                config.low_hz, config.high_hz, sample_rate
            )));
        }
        if config.order == 0 {
            return Err(PipelineError::InvalidInput(
                "filter order must be > 0".to_string(),
            ));
        }

        let order = config.order;

        // Prewarp normalized corners for a bilinear transform at fs = 2
        let fs2 = 4.0;
        let w1 = fs2 * (PI * (config.low_hz / nyquist) / 2.0).tan();
        let w2 = fs2 * (PI * (config.high_hz / nyquist) / 2.0).tan();
        let bw = w2 - w1;
        let wo2 = w1 * w2;

        // Analog prototype poles on the left half of the unit circle
        let mut analog_poles = Vec::with_capacity(2 * order);
        for k in 0..order {
            let m = 2.0 * k as f64 - (order as f64 - 1.0);
            let p = -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64));
            let scaled = p * (bw / 2.0);
            let offset = (scaled * scaled - wo2).sqrt();
            analog_poles.push(scaled + offset);
            analog_poles.push(scaled - offset);
        }

        // N analog zeros at the origin map to +1, N more appear at -1
        let mut gain = Complex64::new(bw.powi(order as i32) * fs2.powi(order as i32), 0.0);
        let mut poles = Vec::with_capacity(analog_poles.len());
        for &p in &analog_poles {
            gain /= fs2 - p;
            poles.push((fs2 + p) / (fs2 - p));
        }
        let gain = gain.re;

        if let Some(p) = poles.iter().find(|p| p.norm() >= 1.0) {
            return Err(PipelineError::InvalidInput(format!(
                "unstable band-pass design: pole magnitude {:.6}",
                p.norm()
            )));
        }

        let sections = pair_sections(&poles, gain, order)?;

        log::debug!(
            "Designed order-{} Butterworth band-pass {}-{} Hz at {} Hz ({} sections, gain {:.3e})",
            2 * order,
            config.low_hz,
            config.high_hz,
            sample_rate,
            sections.len(),
            gain
        );

        Ok(Self {
            sections,
            sample_rate,
        })
    }

    /// Second-order sections in cascade order
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Filter a signal from zero initial state
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        let mut states = vec![BiquadState::default(); self.sections.len()];
        signal
            .iter()
            .map(|&x| {
                self.sections
                    .iter()
                    .zip(states.iter_mut())
                    .fold(x, |acc, (section, state)| state.process(section, acc))
            })
            .collect()
    }

    /// Magnitude response at a frequency in Hz
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / self.sample_rate;
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        self.sections
            .iter()
            .map(|s| {
                let num = s.b[0] + z1 * s.b[1] + z2 * s.b[2];
                let den = s.a[0] + z1 * s.a[1] + z2 * s.a[2];
                num / den
            })
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }
}

/// Group z-plane poles into conjugate (or real) pairs, one section each
///
/// Every section carries one zero at +1 and one at -1, i.e. `1 - z^-2`.
fn pair_sections(poles: &[Complex64], gain: f64, order: usize) -> Result<Vec<Biquad>> {
    let mut reals: Vec<f64> = Vec::new();
    let mut sections = Vec::with_capacity(order);

    for p in poles {
        if p.im.abs() < REAL_POLE_TOLERANCE {
            reals.push(p.re);
        } else if p.im > 0.0 {
            sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -2.0 * p.re, p.norm_sqr()],
            });
        }
    }

    reals.sort_by(|a, b| a.total_cmp(b));
    for pair in reals.chunks(2) {
        if let [r1, r2] = pair {
            sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -(r1 + r2), r1 * r2],
            });
        }
    }

    if sections.len() != order || reals.len() % 2 != 0 {
        return Err(PipelineError::InvalidInput(format!(
            "band-pass design produced {} sections for order {}",
            sections.len(),
            order
        )));
    }

    for b in sections[0].b.iter_mut() {
        *b *= gain;
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_design_default_eeg_band() {
        let filter = ButterworthBandpass::design(&FilterConfig::default(), 128.0).unwrap();
        assert_eq!(filter.sections().len(), 5);

        let pass = filter.magnitude_at(10.0);
        assert!((pass - 1.0).abs() < 0.02, "10 Hz gain should be ~1, got {:.4}", pass);

        let low_stop = filter.magnitude_at(0.1);
        let high_stop = filter.magnitude_at(60.0);
        assert!(low_stop < 0.01, "0.1 Hz should be rejected, got {:.4}", low_stop);
        assert!(high_stop < 0.1, "60 Hz should be attenuated, got {:.4}", high_stop);

        let corner = filter.magnitude_at(45.0);
        assert!(
            (corner - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02,
            "corner gain should be -3 dB, got {:.4}",
            corner
        );
    }

    #[test]
    fn test_filter_removes_dc_and_keeps_alpha() {
        let fs = 128.0;
        let filter = ButterworthBandpass::design(&FilterConfig::default(), fs).unwrap();
        let n = 128 * 10;
        let signal: Vec<f64> = sine(10.0, fs, n).iter().map(|x| x + 50.0).collect();

        let out = filter.filter(&signal);
        assert_eq!(out.len(), n);

        let tail = &out[n / 2..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        let peak = tail.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        assert!(mean.abs() < 0.05, "DC should be removed, mean {:.4}", mean);
        assert!((peak - 1.0).abs() < 0.05, "10 Hz amplitude preserved, peak {:.4}", peak);
    }

    #[test]
    fn test_filter_is_causal() {
        let filter = ButterworthBandpass::design(&FilterConfig::default(), 128.0).unwrap();
        let mut impulse = vec![0.0; 64];
        impulse[10] = 1.0;
        let out = filter.filter(&impulse);
        assert!(out[..10].iter().all(|&v| v == 0.0), "no output before the impulse");
        assert!(out[10..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_invalid_corners() {
        let config = FilterConfig {
            low_hz: 10.0,
            high_hz: 70.0,
            order: 5,
        };
        assert!(ButterworthBandpass::design(&config, 128.0).is_err());
    }
}
