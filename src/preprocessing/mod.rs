//! Signal preprocessing
//!
//! Turns a raw recording into a cleaned one of the same shape:
//! - CSV loading with channel-name matching
//! - Per-channel mean imputation of missing samples
//! - Causal Butterworth band-pass filtering per channel

pub mod bandpass;
pub mod imputation;
pub mod recording;

use std::path::{Path, PathBuf};

use crate::config::{ChannelConvention, PipelineConfig};
use crate::error::{PipelineError, Result};

use bandpass::ButterworthBandpass;
use imputation::impute_channel_means;
use recording::{load_csv, Recording};

/// Preprocessor bound to one configuration
///
/// The band-pass filter is designed once and reused for every recording.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    channels: Vec<String>,
    filter: ButterworthBandpass,
}

impl Preprocessor {
    /// Create a preprocessor for a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the filter cannot be designed.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            channels: config.channels.clone(),
            filter: ButterworthBandpass::design(&config.filter, config.sample_rate)?,
        })
    }

    /// The band-pass filter in use
    pub fn filter(&self) -> &ButterworthBandpass {
        &self.filter
    }

    /// Impute and filter a recording, returning a new one in configured channel order
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if the recording does not carry exactly the
    /// configured channels, in order.
    pub fn process(&self, recording: &Recording) -> Result<Recording> {
        if recording.channel_names() != self.channels.as_slice() {
            return Err(PipelineError::SchemaMismatch {
                path: PathBuf::from("<memory>"),
                message: format!(
                    "recording channels {:?} differ from configured {:?}",
                    recording.channel_names(),
                    self.channels
                ),
            });
        }

        let mut cleaned = recording.clone();
        let report = impute_channel_means(&mut cleaned);
        if report.total_missing() > 0 {
            log::debug!("Imputed {} missing samples", report.total_missing());
        }

        for channel in cleaned.channels_mut() {
            *channel = self.filter.filter(channel);
        }

        Ok(cleaned)
    }

    /// Load a CSV recording and preprocess it
    ///
    /// Returns the cleaned recording and the column convention that matched.
    pub fn process_file(
        &self,
        path: impl AsRef<Path>,
        convention: ChannelConvention,
    ) -> Result<(Recording, ChannelConvention)> {
        let (raw, resolved) = load_csv(path, &self.channels, convention)?;
        Ok((self.process(&raw)?, resolved))
    }
}

/// Preprocess one recording with a configuration
///
/// Convenience wrapper designing the filter for a single call.
pub fn preprocess(recording: &Recording, config: &PipelineConfig) -> Result<Recording> {
    Preprocessor::new(config)?.process(recording)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_keeps_shape_and_order() {
        let config = PipelineConfig::default();
        let n = 512;
        let data: Vec<Vec<f64>> = (0..config.channels.len())
            .map(|c| {
                (0..n)
                    .map(|i| {
                        if i == 7 {
                            f64::NAN
                        } else {
                            ((i + c) as f64 * 0.3).sin()
                        }
                    })
                    .collect()
            })
            .collect();
        let rec = Recording::new(config.channels.clone(), data).unwrap();

        let cleaned = preprocess(&rec, &config).unwrap();

        assert_eq!(cleaned.n_channels(), rec.n_channels());
        assert_eq!(cleaned.n_samples(), n);
        assert_eq!(cleaned.channel_names(), rec.channel_names());
        assert!(cleaned.channels().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_preprocess_rejects_foreign_channels() {
        let config = PipelineConfig::default();
        let rec = Recording::new(vec!["Cz".to_string()], vec![vec![0.0; 10]]).unwrap();
        assert!(matches!(
            preprocess(&rec, &config),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }
}
