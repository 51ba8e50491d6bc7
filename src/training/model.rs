//! Fitted classifier variants

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelKind;
use crate::error::{PipelineError, Result};

use super::forest::RandomForest;
use super::knn::KnnClassifier;
use super::svm::SvmClassifier;

/// A fitted model, one variant per [`ModelKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    /// RBF support vector machine
    Svm(SvmClassifier),
    /// Random forest
    RandomForest(RandomForest),
    /// k-nearest neighbours
    Knn(KnnClassifier),
}

impl Classifier {
    /// Fit the variant described by `kind` on standardised rows
    ///
    /// `seed` only affects randomised variants.
    pub fn fit(kind: &ModelKind, rows: &[Vec<f64>], labels: &[u8], seed: u64) -> Result<Self> {
        Ok(match kind {
            ModelKind::Svm { c, gamma } => Classifier::Svm(SvmClassifier::fit(rows, labels, *c, *gamma)?),
            ModelKind::RandomForest {
                n_trees,
                max_features,
            } => Classifier::RandomForest(RandomForest::fit(
                rows,
                labels,
                *n_trees,
                *max_features,
                seed,
            )?),
            ModelKind::Knn { k } => Classifier::Knn(KnnClassifier::fit(rows, labels, *k)?),
        })
    }

    /// Display name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Svm(_) => "SVM",
            Classifier::RandomForest(_) => "RandomForest",
            Classifier::Knn(_) => "KNN",
        }
    }

    /// Expected row length
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Svm(m) => m.n_features(),
            Classifier::RandomForest(m) => m.n_features(),
            Classifier::Knn(m) => m.n_features(),
        }
    }

    /// Predict the label of one standardised row
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the row length differs from training.
    pub fn predict(&self, row: &[f64]) -> Result<u8> {
        if row.len() != self.n_features() {
            return Err(PipelineError::InvalidInput(format!(
                "{} expects {} features, got {}",
                self.name(),
                self.n_features(),
                row.len()
            )));
        }
        Ok(match self {
            Classifier::Svm(m) => m.predict(row),
            Classifier::RandomForest(m) => m.predict(row),
            Classifier::Knn(m) => m.predict(row),
        })
    }

    /// Predict many rows in parallel, keeping input order
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>> {
        rows.par_iter().map(|r| self.predict(r)).collect()
    }
}

/// Fraction of predictions equal to the truth
pub fn accuracy(predicted: &[u8], truth: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    hits as f64 / truth.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Gamma, MaxFeatures};

    #[test]
    fn test_every_kind_fits_and_predicts() {
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let centre = if i < 10 { -1.0 } else { 1.0 };
                vec![centre + 0.01 * i as f64]
            })
            .collect();
        let labels: Vec<u8> = (0..20).map(|i| if i < 10 { 0 } else { 1 }).collect();

        let kinds = [
            ModelKind::Svm {
                c: 10.0,
                gamma: Gamma::Scale,
            },
            ModelKind::RandomForest {
                n_trees: 10,
                max_features: MaxFeatures::Sqrt,
            },
            ModelKind::Knn { k: 3 },
        ];
        for kind in &kinds {
            let model = Classifier::fit(kind, &rows, &labels, 42).unwrap();
            assert_eq!(model.name(), kind.name());
            let predicted = model.predict_batch(&rows).unwrap();
            assert_eq!(accuracy(&predicted, &labels), 1.0, "{} misclassified", kind.name());
            assert!(model.predict(&[0.0, 0.0]).is_err());
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 2, 3, 4], &[1, 2, 0, 0]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
