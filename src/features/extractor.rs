//! Per-window feature vector assembly
//!
//! For each channel, in configured order, the block is:
//!
//! | slot | feature |
//! |------|---------|
//! | 0 | mean |
//! | 1 | variance |
//! | 2 | skewness |
//! | 3 | excess kurtosis |
//! | 4 | peak-to-peak range |
//! | 5 | interquartile range |
//! | 6 | Shannon entropy of magnitudes |
//! | 7 | sample entropy |
//! | 8 | Hjorth mobility |
//! | 9 | Hjorth complexity |
//! | 10.. | band power per configured band |
//!
//! A channel whose computation fails gets a block of NaN sentinels of the
//! same width, so the vector length never changes.

use crate::config::{PipelineConfig, SampleEntropyConfig, SCALAR_FEATURES_PER_CHANNEL};
use crate::config::FrequencyBand;
use crate::error::{PipelineError, Result};

use super::entropy::{sample_entropy, shannon_entropy};
use super::hjorth::hjorth_parameters;
use super::spectral::WelchEstimator;
use super::statistics::{
    excess_kurtosis, interquartile_range, mean, peak_to_peak, skewness, variance,
};

/// Names of the scalar slots of a channel block, in order
pub const SCALAR_FEATURE_NAMES: [&str; SCALAR_FEATURES_PER_CHANNEL] = [
    "mean",
    "variance",
    "skewness",
    "kurtosis",
    "range",
    "iqr",
    "shannon_entropy",
    "sample_entropy",
    "hjorth_mobility",
    "hjorth_complexity",
];

/// Fixed-length feature vector of one window
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Feature values in channel-major order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the vector holds no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take ownership of the values
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

/// Window feature extractor
///
/// Holds only read-only configuration and a planned FFT, so one instance
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    channels: Vec<String>,
    bands: Vec<FrequencyBand>,
    sample_entropy: SampleEntropyConfig,
    welch: WelchEstimator,
}

impl FeatureExtractor {
    /// Create an extractor for a configuration
    pub fn new(config: &PipelineConfig) -> Self {
        let segment_len = config.welch_segment_len.min(config.window_len());
        Self {
            channels: config.channels.clone(),
            bands: config.bands.clone(),
            sample_entropy: config.sample_entropy.clone(),
            welch: WelchEstimator::new(config.sample_rate, segment_len),
        }
    }

    /// Width of one channel block
    pub fn features_per_channel(&self) -> usize {
        SCALAR_FEATURES_PER_CHANNEL + self.bands.len()
    }

    /// Length of every vector this extractor produces
    pub fn feature_len(&self) -> usize {
        self.channels.len() * self.features_per_channel()
    }

    /// Names of every feature, e.g. `AF3_mean` or `O1_alpha_power`
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.feature_len());
        for channel in &self.channels {
            for scalar in SCALAR_FEATURE_NAMES {
                names.push(format!("{}_{}", channel, scalar));
            }
            for band in &self.bands {
                names.push(format!("{}_{}_power", channel, band.name));
            }
        }
        names
    }

    /// Extract the feature vector of a channel-major window
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the window does not have one row per
    /// configured channel. Numeric problems inside a channel never fail the
    /// call; they become NaN sentinels.
    pub fn extract(&self, window: &[Vec<f64>]) -> Result<FeatureVector> {
        if window.len() != self.channels.len() {
            return Err(PipelineError::InvalidInput(format!(
                "window has {} channels, expected {}",
                window.len(),
                self.channels.len()
            )));
        }

        let width = self.features_per_channel();
        let mut values = Vec::with_capacity(self.feature_len());

        for (name, samples) in self.channels.iter().zip(window) {
            match self.channel_features(samples) {
                Ok(block) => values.extend(block),
                Err(e) => {
                    log::debug!("Channel {} features indeterminate: {}", name, e);
                    values.extend(std::iter::repeat(f64::NAN).take(width));
                }
            }
        }

        debug_assert_eq!(values.len(), self.feature_len());
        Ok(FeatureVector { values })
    }

    /// Feature block for one channel
    ///
    /// Fails with `NumericIndeterminate` on empty or non-finite input; any
    /// other undefined quantity is reported in-place as NaN.
    pub fn channel_features(&self, samples: &[f64]) -> Result<Vec<f64>> {
        if samples.is_empty() {
            return Err(PipelineError::NumericIndeterminate(
                "empty channel".to_string(),
            ));
        }
        if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
            return Err(PipelineError::NumericIndeterminate(format!(
                "non-finite sample {}",
                bad
            )));
        }

        let hjorth = hjorth_parameters(samples);
        let psd = self.welch.psd(samples)?;

        let mut block = Vec::with_capacity(self.features_per_channel());
        block.push(mean(samples));
        block.push(variance(samples));
        block.push(skewness(samples));
        block.push(excess_kurtosis(samples));
        block.push(peak_to_peak(samples));
        block.push(interquartile_range(samples));
        block.push(shannon_entropy(samples));
        block.push(sample_entropy(
            samples,
            self.sample_entropy.embedding_dim,
            self.sample_entropy.tolerance_ratio,
        ));
        block.push(hjorth.mobility);
        block.push(hjorth.complexity);
        for band in &self.bands {
            block.push(psd.band_power(band.low_hz, band.high_hz));
        }

        Ok(block)
    }
}

/// Extract one window with a configuration
///
/// Convenience wrapper building a throwaway extractor.
pub fn extract(window: &[Vec<f64>], config: &PipelineConfig) -> Result<FeatureVector> {
    FeatureExtractor::new(config).extract(window)
}
