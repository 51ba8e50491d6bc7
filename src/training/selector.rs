//! Train every candidate model and keep the most accurate one

use crate::config::{ModelKind, TrainConfig};
use crate::dataset::LabeledDataset;
use crate::error::{PipelineError, Result};

use super::artifact::ModelArtifact;
use super::model::{accuracy, Classifier};
use super::scaler::StandardScaler;
use super::split::{stratified_split, Split};

/// Held-out score of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport {
    /// Display name
    pub name: String,
    /// Hyperparameters the candidate was trained with
    pub kind: ModelKind,
    /// Test-split accuracy
    pub accuracy: f64,
}

/// Result of one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The selected model with its scaler
    pub artifact: ModelArtifact,
    /// One report per candidate, in menu order
    pub reports: Vec<ModelReport>,
    /// Index of the selected candidate in `reports`
    pub selected: usize,
    /// Train/test partition used for evaluation
    pub split: Split,
    /// Labels the selected model assigned to the test rows, in `split.test` order
    pub test_predictions: Vec<u8>,
}

/// Split, standardise, train the model menu and select the winner
///
/// The scaler is fitted on the training rows only and then applied to both
/// halves. Accuracy ties go to the candidate declared first.
///
/// # Errors
///
/// `EmptyDataset` for a dataset without rows, `InvalidInput` for an empty
/// model menu or a dataset too small to split.
pub fn train(dataset: &LabeledDataset, config: &TrainConfig) -> Result<TrainingOutcome> {
    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if config.models.is_empty() {
        return Err(PipelineError::InvalidInput(
            "model menu is empty".to_string(),
        ));
    }

    let split = stratified_split(dataset.labels(), config.test_fraction, config.seed)?;
    let train_set = dataset.subset(&split.train);
    let test_set = dataset.subset(&split.test);

    let scaler = StandardScaler::fit(train_set.features())?;
    let x_train = scaler.transform(train_set.features())?;
    let x_test = scaler.transform(test_set.features())?;

    log::info!(
        "Training {} models on {} rows, evaluating on {}",
        config.models.len(),
        x_train.len(),
        x_test.len()
    );

    let mut reports = Vec::with_capacity(config.models.len());
    let mut best: Option<(usize, f64, Classifier, Vec<u8>)> = None;

    for (i, kind) in config.models.iter().enumerate() {
        let model = Classifier::fit(kind, &x_train, train_set.labels(), config.seed)?;
        let predicted = model.predict_batch(&x_test)?;
        let acc = accuracy(&predicted, test_set.labels());
        log::info!("{} accuracy: {:.4}", kind.name(), acc);

        let better = best.as_ref().map_or(true, |(_, b, _, _)| acc > *b);
        reports.push(ModelReport {
            name: kind.name().to_string(),
            kind: kind.clone(),
            accuracy: acc,
        });
        if better {
            best = Some((i, acc, model, predicted));
        }
    }

    let (selected, test_accuracy, classifier, test_predictions) = best.ok_or_else(|| {
        PipelineError::InvalidInput("no model was trained".to_string())
    })?;

    log::info!(
        "Selected {} (accuracy {:.4})",
        reports[selected].name,
        test_accuracy
    );

    let artifact = ModelArtifact::new(scaler, classifier, test_accuracy)?;

    Ok(TrainingOutcome {
        artifact,
        reports,
        selected,
        split,
        test_predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Gamma;

    fn two_clusters() -> LabeledDataset {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let label = (i % 2) as u8;
            let centre = if label == 0 { -2.0 } else { 2.0 };
            let jitter = ((i * 13) % 7) as f64 * 0.05;
            rows.push(vec![centre + jitter, -centre + jitter, jitter]);
            labels.push(label);
        }
        LabeledDataset::new(rows, labels).unwrap()
    }

    #[test]
    fn test_reports_in_menu_order() {
        let outcome = train(&two_clusters(), &TrainConfig::default()).unwrap();
        let names: Vec<&str> = outcome.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SVM", "RandomForest", "KNN"]);
        assert!(outcome.reports.iter().all(|r| r.accuracy == 1.0));
        // All tie at 1.0: the first declared wins
        assert_eq!(outcome.selected, 0);
        assert_eq!(outcome.artifact.metadata().model_name, "SVM");
    }

    #[test]
    fn test_artifact_reproduces_evaluation_labels() {
        let dataset = two_clusters();
        let outcome = train(&dataset, &TrainConfig::default()).unwrap();
        for (&row, &expected) in outcome.split.test.iter().zip(&outcome.test_predictions) {
            assert_eq!(outcome.artifact.predict(dataset.row(row)).unwrap(), expected);
        }
    }

    #[test]
    fn test_tie_break_respects_custom_order() {
        let config = TrainConfig {
            models: vec![
                ModelKind::Knn { k: 1 },
                ModelKind::Svm {
                    c: 1.0,
                    gamma: Gamma::Scale,
                },
            ],
            ..TrainConfig::default()
        };
        let outcome = train(&two_clusters(), &config).unwrap();
        assert_eq!(outcome.artifact.metadata().model_name, "KNN");
    }

    #[test]
    fn test_empty_menu_rejected() {
        let config = TrainConfig {
            models: Vec::new(),
            ..TrainConfig::default()
        };
        assert!(train(&two_clusters(), &config).is_err());
    }
}
