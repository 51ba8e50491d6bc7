//! Window classification with a loaded artifact

use crate::config::PipelineConfig;
use crate::dataset::windowing::window_starts;
use crate::error::{PipelineError, Result};
use crate::features::FeatureExtractor;
use crate::preprocessing::recording::Recording;
use crate::preprocessing::Preprocessor;
use crate::training::ModelArtifact;

use super::mailbox::PredictionSlot;

/// Classifies windows and publishes each label to a [`PredictionSlot`]
#[derive(Debug, Clone)]
pub struct LivePredictor {
    artifact: ModelArtifact,
    config: PipelineConfig,
    extractor: FeatureExtractor,
    slot: PredictionSlot,
}

impl LivePredictor {
    /// Pair an artifact with the configuration its features were built with
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration produces vectors of a
    /// different length than the artifact accepts.
    pub fn new(artifact: ModelArtifact, config: PipelineConfig, slot: PredictionSlot) -> Result<Self> {
        let expected = artifact.metadata().feature_len;
        if config.feature_len() != expected {
            return Err(PipelineError::InvalidInput(format!(
                "configuration yields {} features, artifact expects {}",
                config.feature_len(),
                expected
            )));
        }
        let extractor = FeatureExtractor::new(&config);
        Ok(Self {
            artifact,
            config,
            extractor,
            slot,
        })
    }

    /// The slot predictions are published to
    pub fn slot(&self) -> &PredictionSlot {
        &self.slot
    }

    /// Classify one preprocessed window and publish the label
    pub fn predict_window(&self, window: &[Vec<f64>]) -> Result<u8> {
        let features = self.extractor.extract(window)?;
        let label = self.artifact.predict(features.as_slice())?;
        self.slot.publish(label);
        Ok(label)
    }

    /// Preprocess a raw recording and classify every full window in order
    pub fn predict_recording(&self, recording: &Recording) -> Result<Vec<u8>> {
        let cleaned = Preprocessor::new(&self.config)?.process(recording)?;
        let window_len = self.config.window_len();
        window_starts(cleaned.n_samples(), window_len, self.config.step_len())
            .map(|start| self.predict_window(&cleaned.slice(start, window_len)))
            .collect()
    }
}
