//! # EEG Gesture
//!
//! An offline pipeline that turns raw multichannel EEG recordings into
//! fixed-length feature vectors and selects a hand-gesture classifier.
//!
//! ## Features
//!
//! - **Preprocessing**: CSV loading with channel matching, mean imputation, causal Butterworth band-pass
//! - **Feature Extraction**: 15 features per channel (moments, entropies, Hjorth, Welch band powers)
//! - **Dataset Building**: sliding windows over a class-folder corpus with seeded noise augmentation
//! - **Model Selection**: RBF SVM, random forest and k-NN scored on a stratified held-out split
//! - **Live Side**: latest-wins prediction slot and label to pose mapping
//!
//! ## Quick Start
//!
//! ```no_run
//! use eeg_gesture::{run_pipeline, GestureVocabulary, PipelineConfig, TrainConfig};
//!
//! let (outcome, report) = run_pipeline(
//!     "data/",
//!     &GestureVocabulary::default(),
//!     &PipelineConfig::default(),
//!     &TrainConfig::default(),
//! )?;
//!
//! println!("{} windows, {} files skipped", report.total_windows(), report.skipped.len());
//! println!("Selected {}", outcome.artifact.metadata().model_name);
//! outcome.artifact.save("model/")?;
//! # Ok::<(), eeg_gesture::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! The pipeline follows this flow:
//!
//! ```text
//! Recording → Preprocessing → Windowing → Feature Extraction → Dataset → Train/Select → Artifact
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod live;
pub mod preprocessing;
pub mod training;

// Re-export main types
pub use config::{ChannelConvention, GestureVocabulary, ModelKind, PipelineConfig, TrainConfig};
pub use dataset::{BuildReport, DatasetBuilder, LabeledDataset};
pub use error::PipelineError;
pub use features::{FeatureExtractor, FeatureVector};
pub use live::{LivePredictor, PoseDriver, PoseMap, PredictionSlot};
pub use preprocessing::{recording::Recording, Preprocessor};
pub use training::{train, ModelArtifact, TrainingOutcome};

/// Build a dataset from a corpus and train/select a classifier on it
///
/// # Arguments
///
/// * `root` - Directory with one sub-folder per gesture class
/// * `vocabulary` - Folder name to label mapping
/// * `pipeline` - Preprocessing, windowing and feature parameters
/// * `training` - Split and model menu parameters
///
/// # Returns
///
/// The training outcome (selected artifact and per-model reports) and the
/// dataset build report
///
/// # Errors
///
/// Returns `PipelineError` if the corpus yields no windows, a file uses a
/// conflicting column convention, or training cannot proceed
pub fn run_pipeline(
    root: impl AsRef<std::path::Path>,
    vocabulary: &GestureVocabulary,
    pipeline: &PipelineConfig,
    training: &TrainConfig,
) -> error::Result<(TrainingOutcome, BuildReport)> {
    use std::time::Instant;
    let start_time = Instant::now();

    let (dataset, report) = DatasetBuilder::new(pipeline.clone(), vocabulary.clone())?.build(root)?;
    log::debug!(
        "Dataset ready: {} x {} in {:.1} ms",
        dataset.len(),
        dataset.n_features(),
        start_time.elapsed().as_secs_f32() * 1000.0
    );

    let outcome = train(&dataset, training)?;
    log::debug!(
        "Pipeline finished in {:.1} ms",
        start_time.elapsed().as_secs_f32() * 1000.0
    );

    Ok((outcome, report))
}
