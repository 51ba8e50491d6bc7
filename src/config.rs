//! Configuration parameters for the EEG gesture pipeline
//!
//! Every component receives its configuration explicitly; nothing is read
//! from global state, so several configurations (for example different
//! headset sample rates) can coexist in one process.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Canonical 14-electrode montage of the reference headset
pub const DEFAULT_CHANNELS: [&str; 14] = [
    "AF3", "F7", "F3", "FC5", "T7", "P7", "O1", "O2", "P8", "T8", "FC6", "F4", "F8", "AF4",
];

/// Number of scalar (non-spectral) features computed per channel
pub const SCALAR_FEATURES_PER_CHANNEL: usize = 10;

/// How recording column names are matched against the configured channel names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelConvention {
    /// Column names equal the configured names
    Exact,
    /// Column names are the lowercase form of the configured names
    Lowercase,
    /// Try `Exact`, then `Lowercase`; the first file of a dataset fixes the choice
    AutoDetect,
}

/// A named physiological frequency band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Band name (used in feature names)
    pub name: String,
    /// Lower edge in Hz (inclusive)
    pub low_hz: f64,
    /// Upper edge in Hz (inclusive)
    pub high_hz: f64,
}

impl FrequencyBand {
    /// Create a band
    pub fn new(name: &str, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name: name.to_string(),
            low_hz,
            high_hz,
        }
    }
}

/// Butterworth band-pass parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Lower corner frequency in Hz (default: 1.0)
    pub low_hz: f64,
    /// Upper corner frequency in Hz (default: 45.0)
    pub high_hz: f64,
    /// Prototype order; the band-pass has twice this order (default: 5)
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            low_hz: 1.0,
            high_hz: 45.0,
            order: 5,
        }
    }
}

/// Sample entropy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleEntropyConfig {
    /// Embedding dimension m (default: 2)
    pub embedding_dim: usize,
    /// Tolerance as a fraction of the channel standard deviation (default: 0.2)
    pub tolerance_ratio: f64,
}

impl Default for SampleEntropyConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 2,
            tolerance_ratio: 0.2,
        }
    }
}

/// Gaussian noise augmentation applied to each window before extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Noise standard deviation relative to the channel's own standard deviation (default: 0.02)
    pub relative_noise: f64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            relative_noise: 0.02,
        }
    }
}

/// Pipeline configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sample rate of every recording in Hz (default: 128.0)
    pub sample_rate: f64,

    /// Window duration in seconds (default: 1.5)
    pub window_secs: f64,

    /// Step between consecutive windows in seconds (default: 0.5)
    pub step_secs: f64,

    /// Ordered channel names; features are emitted in this order
    pub channels: Vec<String>,

    /// Column name matching convention (default: AutoDetect)
    pub channel_convention: ChannelConvention,

    /// Frequency bands integrated from the Welch PSD
    pub bands: Vec<FrequencyBand>,

    /// Band-pass filter applied per channel
    pub filter: FilterConfig,

    /// Welch segment length in samples (default: 256, clamped to the window length)
    pub welch_segment_len: usize,

    /// Sample entropy parameters
    pub sample_entropy: SampleEntropyConfig,

    /// Window augmentation; `None` disables it
    pub augmentation: Option<AugmentationConfig>,

    /// Seed for the augmentation generator (default: 42)
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 128.0,
            window_secs: 1.5,
            step_secs: 0.5,
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            channel_convention: ChannelConvention::AutoDetect,
            bands: vec![
                FrequencyBand::new("delta", 1.0, 4.0),
                FrequencyBand::new("theta", 4.0, 7.0),
                FrequencyBand::new("alpha", 8.0, 12.0),
                FrequencyBand::new("beta", 13.0, 30.0),
                FrequencyBand::new("gamma", 30.0, 45.0),
            ],
            filter: FilterConfig::default(),
            welch_segment_len: 256,
            sample_entropy: SampleEntropyConfig::default(),
            augmentation: Some(AugmentationConfig::default()),
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Window length in samples
    pub fn window_len(&self) -> usize {
        (self.window_secs * self.sample_rate).round() as usize
    }

    /// Step length in samples
    pub fn step_len(&self) -> usize {
        (self.step_secs * self.sample_rate).round() as usize
    }

    /// Number of features produced for one channel
    pub fn features_per_channel(&self) -> usize {
        SCALAR_FEATURES_PER_CHANNEL + self.bands.len()
    }

    /// Length of the full feature vector
    pub fn feature_len(&self) -> usize {
        self.channels.len() * self.features_per_channel()
    }

    /// Check the configuration for values no component can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0) {
            return Err(PipelineError::InvalidInput(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.window_len() < 3 {
            return Err(PipelineError::InvalidInput(
                "window must span at least 3 samples".to_string(),
            ));
        }
        if self.step_len() == 0 {
            return Err(PipelineError::InvalidInput(
                "step must span at least 1 sample".to_string(),
            ));
        }
        if self.channels.is_empty() {
            return Err(PipelineError::InvalidInput(
                "channel set is empty".to_string(),
            ));
        }
        let nyquist = self.sample_rate / 2.0;
        for band in &self.bands {
            if !(band.low_hz > 0.0 && band.low_hz < band.high_hz && band.high_hz < nyquist) {
                return Err(PipelineError::InvalidInput(format!(
                    "band {} ({}-{} Hz) must lie strictly inside 0-{} Hz",
                    band.name, band.low_hz, band.high_hz, nyquist
                )));
            }
        }
        let f = &self.filter;
        if !(f.low_hz > 0.0 && f.low_hz < f.high_hz && f.high_hz < nyquist) {
            return Err(PipelineError::InvalidInput(format!(
                "filter corners {}-{} Hz must satisfy 0 < low < high < {} Hz",
                f.low_hz, f.high_hz, nyquist
            )));
        }
        if f.order == 0 {
            return Err(PipelineError::InvalidInput(
                "filter order must be > 0".to_string(),
            ));
        }
        if self.sample_entropy.embedding_dim == 0 {
            return Err(PipelineError::InvalidInput(
                "sample entropy embedding dimension must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Ordered mapping from class folder name to integer label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureVocabulary {
    classes: Vec<(String, u8)>,
}

impl Default for GestureVocabulary {
    fn default() -> Self {
        Self::new(&[("open", 0), ("close", 1), ("index", 2), ("victory", 3)])
    }
}

impl GestureVocabulary {
    /// Build a vocabulary from `(folder, label)` pairs, kept in the given order
    pub fn new(classes: &[(&str, u8)]) -> Self {
        Self {
            classes: classes
                .iter()
                .map(|(name, label)| (name.to_string(), *label))
                .collect(),
        }
    }

    /// Iterate `(folder, label)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.classes.iter().map(|(n, l)| (n.as_str(), *l))
    }

    /// Label for a folder name
    pub fn label_of(&self, name: &str) -> Option<u8> {
        self.iter().find(|(n, _)| *n == name).map(|(_, l)| l)
    }

    /// Folder name for a label
    pub fn name_of(&self, label: u8) -> Option<&str> {
        self.iter().find(|(_, l)| *l == label).map(|(n, _)| n)
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no classes are declared
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// How the SVM kernel width is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * var(X_train))`
    Scale,
    /// Fixed value
    Value(f64),
}

/// Number of candidate features examined at each tree split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`
    Sqrt,
    /// Every feature
    All,
}

/// A trainable classifier variant together with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    /// RBF-kernel support vector machine, one-vs-one multiclass
    Svm {
        /// Box constraint
        c: f64,
        /// Kernel width
        gamma: Gamma,
    },
    /// Bagged CART ensemble with Gini splits
    RandomForest {
        /// Number of trees
        n_trees: usize,
        /// Candidate features per split
        max_features: MaxFeatures,
    },
    /// k-nearest-neighbour majority vote
    Knn {
        /// Neighbour count
        k: usize,
    },
}

impl ModelKind {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Svm { .. } => "SVM",
            ModelKind::RandomForest { .. } => "RandomForest",
            ModelKind::Knn { .. } => "KNN",
        }
    }
}

/// Trainer/selector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Fraction of each class held out for evaluation (default: 0.2)
    pub test_fraction: f64,
    /// Seed for the split and for randomized models (default: 42)
    pub seed: u64,
    /// Candidate models in tie-break order
    pub models: Vec<ModelKind>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            models: vec![
                ModelKind::Svm {
                    c: 10.0,
                    gamma: Gamma::Scale,
                },
                ModelKind::RandomForest {
                    n_trees: 100,
                    max_features: MaxFeatures::Sqrt,
                },
                ModelKind::Knn { k: 5 },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lengths() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_len(), 192);
        assert_eq!(config.step_len(), 64);
        assert_eq!(config.features_per_channel(), 15);
        assert_eq!(config.feature_len(), 14 * 15);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_filter_above_nyquist() {
        let config = PipelineConfig {
            sample_rate: 80.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_band_edges_are_open_interval() {
        let with_band = |low: f64, high: f64| {
            let mut config = PipelineConfig::default();
            config.bands[0] = FrequencyBand::new("delta", low, high);
            config
        };

        assert!(with_band(0.0, 4.0).validate().is_err(), "DC edge must be rejected");
        assert!(with_band(30.0, 64.0).validate().is_err(), "Nyquist edge must be rejected");
        assert!(with_band(0.5, 4.0).validate().is_ok());
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_vocabulary_lookup() {
        let vocab = GestureVocabulary::default();
        assert_eq!(vocab.label_of("victory"), Some(3));
        assert_eq!(vocab.name_of(1), Some("close"));
        assert_eq!(vocab.label_of("thumb"), None);
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = PipelineConfig {
            augmentation: None,
            ..PipelineConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
