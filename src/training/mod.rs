//! Model training, selection and persistence
//!
//! This module contains:
//! - Stratified train/test splitting
//! - Per-feature standardisation
//! - The classifier menu (RBF SVM, random forest, k-NN)
//! - Accuracy-based selection
//! - The persisted scaler + classifier artifact

pub mod artifact;
pub mod forest;
pub mod knn;
pub mod model;
pub mod scaler;
pub mod selector;
pub mod split;
pub mod svm;

pub use artifact::{ArtifactMetadata, ModelArtifact};
pub use model::Classifier;
pub use scaler::StandardScaler;
pub use selector::{train, ModelReport, TrainingOutcome};
