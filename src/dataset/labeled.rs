//! Labeled feature matrix

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Feature matrix with a parallel label vector
///
/// Every row has the same length and there is exactly one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<u8>,
    n_features: usize,
}

/// On-disk form; JSON has no NaN so missing features are written as `null`
#[derive(Serialize, Deserialize)]
struct DatasetFile {
    n_features: usize,
    labels: Vec<u8>,
    features: Vec<Vec<Option<f64>>>,
}

impl LabeledDataset {
    /// Create a dataset from rows and labels
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the row and label counts differ or the rows
    /// do not share one length.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<u8>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature rows for {} labels",
                features.len(),
                labels.len()
            )));
        }
        let n_features = features.first().map_or(0, Vec::len);
        if let Some(bad) = features.iter().position(|r| r.len() != n_features) {
            return Err(PipelineError::InvalidInput(format!(
                "row {} has {} features, expected {}",
                bad,
                features[bad].len(),
                n_features
            )));
        }
        Ok(Self {
            features,
            labels,
            n_features,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row length
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// One feature row
    pub fn row(&self, index: usize) -> &[f64] {
        &self.features[index]
    }

    /// All rows
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// All labels
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Row count per label
    pub fn class_counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Rows at the given indices, in index order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            n_features: self.n_features,
        }
    }

    /// Write the dataset as JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = DatasetFile {
            n_features: self.n_features,
            labels: self.labels.clone(),
            features: self
                .features
                .iter()
                .map(|row| row.iter().map(|&v| (!v.is_nan()).then_some(v)).collect())
                .collect(),
        };
        fs::write(path, serde_json::to_vec(&file)?)?;
        Ok(())
    }

    /// Read a dataset written by [`LabeledDataset::save_json`]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file: DatasetFile = serde_json::from_slice(&fs::read(path)?)?;
        let features = file
            .features
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();
        let dataset = Self::new(features, file.labels)?;
        if !dataset.is_empty() && dataset.n_features != file.n_features {
            return Err(PipelineError::SchemaMismatch {
                path: path.to_path_buf(),
                message: format!(
                    "header declares {} features, rows have {}",
                    file.n_features, dataset.n_features
                ),
            });
        }
        Ok(dataset)
    }
}
