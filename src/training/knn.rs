//! k-nearest-neighbour classifier

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Euclidean distance between two feature vectors
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Majority vote among the `k` closest training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    k: usize,
    rows: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl KnnClassifier {
    /// Store the training rows
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for `k == 0` or empty training data.
    pub fn fit(rows: &[Vec<f64>], labels: &[u8], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(PipelineError::InvalidInput("k must be > 0".to_string()));
        }
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(PipelineError::InvalidInput(
                "k-NN needs one label per non-empty training row".to_string(),
            ));
        }
        Ok(Self {
            k,
            rows: rows.to_vec(),
            labels: labels.to_vec(),
        })
    }

    /// Expected row length
    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Predict the majority label of the nearest neighbours
    ///
    /// Distance ties keep training order; vote ties go to the smallest label.
    pub fn predict(&self, row: &[f64]) -> u8 {
        let mut neighbours: Vec<(f64, usize)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (euclidean_distance(r, row), i))
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes: BTreeMap<u8, usize> = BTreeMap::new();
        for &(_, i) in neighbours.iter().take(self.k) {
            *votes.entry(self.labels[i]).or_insert(0) += 1;
        }

        let mut best = (self.labels[neighbours[0].1], 0);
        for (&label, &count) in &votes {
            if count > best.1 {
                best = (label, count);
            }
        }
        best.0
    }
}
