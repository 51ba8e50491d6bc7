//! Persisted model artifact: fitted scaler plus fitted classifier
//!
//! Stored as two JSON files in one directory. Both carry the same artifact
//! id and feature length, and are only ever loaded together.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

use super::model::Classifier;
use super::scaler::StandardScaler;

/// Classifier file name inside an artifact directory
pub const MODEL_FILE: &str = "gesture_model.json";

/// Scaler file name inside an artifact directory
pub const SCALER_FILE: &str = "scaler.json";

/// Descriptive fields stored with the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Identifier shared by both files of one artifact
    pub artifact_id: String,
    /// Name of the selected model variant
    pub model_name: String,
    /// Feature vector length the artifact accepts
    pub feature_len: usize,
    /// Held-out accuracy measured during selection
    pub test_accuracy: f64,
    /// Crate version that produced the artifact
    pub crate_version: String,
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    metadata: ArtifactMetadata,
    classifier: Classifier,
}

#[derive(Serialize, Deserialize)]
struct ScalerFile {
    artifact_id: String,
    feature_len: usize,
    scaler: StandardScaler,
}

/// Immutable {scaler, classifier} bundle
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    scaler: StandardScaler,
    classifier: Classifier,
    metadata: ArtifactMetadata,
}

fn new_artifact_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}-{:x}", nanos, std::process::id())
}

/// Write through a sibling temp file and rename into place
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ModelArtifact {
    /// Bundle a fitted scaler and classifier
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the two disagree on the feature length.
    pub fn new(scaler: StandardScaler, classifier: Classifier, test_accuracy: f64) -> Result<Self> {
        if scaler.n_features() != classifier.n_features() {
            return Err(PipelineError::InvalidInput(format!(
                "scaler has {} features, classifier {}",
                scaler.n_features(),
                classifier.n_features()
            )));
        }
        let metadata = ArtifactMetadata {
            artifact_id: new_artifact_id(),
            model_name: classifier.name().to_string(),
            feature_len: scaler.n_features(),
            test_accuracy,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Ok(Self {
            scaler,
            classifier,
            metadata,
        })
    }

    /// Artifact metadata
    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// The fitted scaler
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// The fitted classifier
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Scale a raw feature vector and classify it
    pub fn predict(&self, features: &[f64]) -> Result<u8> {
        let scaled = self.scaler.transform_row(features)?;
        self.classifier.predict(&scaled)
    }

    /// Write both files into `dir`, creating it if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let scaler = ScalerFile {
            artifact_id: self.metadata.artifact_id.clone(),
            feature_len: self.metadata.feature_len,
            scaler: self.scaler.clone(),
        };
        let model = ModelFile {
            metadata: self.metadata.clone(),
            classifier: self.classifier.clone(),
        };

        write_atomic(&dir.join(SCALER_FILE), &serde_json::to_vec(&scaler)?)?;
        write_atomic(&dir.join(MODEL_FILE), &serde_json::to_vec(&model)?)?;

        log::info!(
            "Saved {} artifact {} to {:?}",
            self.metadata.model_name,
            self.metadata.artifact_id,
            dir
        );
        Ok(())
    }

    /// Load both files from `dir`
    ///
    /// # Errors
    ///
    /// `NotFound` if either file is missing, `SchemaMismatch` if they do not
    /// belong to the same artifact.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);
        let scaler_path = dir.join(SCALER_FILE);
        for path in [&model_path, &scaler_path] {
            if !path.is_file() {
                return Err(PipelineError::NotFound { path: path.clone() });
            }
        }

        let model: ModelFile = serde_json::from_slice(&fs::read(&model_path)?)?;
        let scaler: ScalerFile = serde_json::from_slice(&fs::read(&scaler_path)?)?;

        if model.metadata.artifact_id != scaler.artifact_id {
            return Err(PipelineError::SchemaMismatch {
                path: scaler_path,
                message: format!(
                    "scaler belongs to artifact {}, model to {}",
                    scaler.artifact_id, model.metadata.artifact_id
                ),
            });
        }
        if model.metadata.feature_len != scaler.feature_len
            || scaler.feature_len != scaler.scaler.n_features()
            || model.metadata.feature_len != model.classifier.n_features()
        {
            return Err(PipelineError::SchemaMismatch {
                path: model_path,
                message: "feature lengths of scaler and classifier disagree".to_string(),
            });
        }

        Ok(Self {
            scaler: scaler.scaler,
            classifier: model.classifier,
            metadata: model.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelKind;

    fn fitted() -> ModelArtifact {
        let rows = vec![vec![0.0, 1.0], vec![0.2, 1.1], vec![4.0, -2.0], vec![4.2, -2.1]];
        let labels = vec![0, 0, 1, 1];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows).unwrap();
        let classifier = Classifier::fit(&ModelKind::Knn { k: 1 }, &scaled, &labels, 0).unwrap();
        ModelArtifact::new(scaler, classifier, 1.0).unwrap()
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("eeg_gesture_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_save_load_predicts_same() {
        let dir = temp_dir("artifact_roundtrip");
        let artifact = fitted();
        artifact.save(&dir).unwrap();
        let loaded = ModelArtifact::load(&dir).unwrap();

        assert_eq!(loaded.metadata(), artifact.metadata());
        for row in [[0.1, 1.0], [4.1, -2.0], [2.5, 0.0]] {
            assert_eq!(loaded.predict(&row).unwrap(), artifact.predict(&row).unwrap());
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let dir_a = temp_dir("artifact_a");
        let dir_b = temp_dir("artifact_b");
        fitted().save(&dir_a).unwrap();
        // Distinct ids need distinct timestamps
        std::thread::sleep(std::time::Duration::from_millis(2));
        fitted().save(&dir_b).unwrap();

        fs::copy(dir_b.join(SCALER_FILE), dir_a.join(SCALER_FILE)).unwrap();
        let err = ModelArtifact::load(&dir_a).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }), "got {}", err);

        fs::remove_dir_all(&dir_a).ok();
        fs::remove_dir_all(&dir_b).ok();
    }

    #[test]
    fn test_missing_half_not_found() {
        let dir = temp_dir("artifact_missing");
        fitted().save(&dir).unwrap();
        fs::remove_file(dir.join(MODEL_FILE)).unwrap();
        assert!(matches!(
            ModelArtifact::load(&dir),
            Err(PipelineError::NotFound { .. })
        ));
        fs::remove_dir_all(&dir).ok();
    }
}
