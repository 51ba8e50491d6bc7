//! Per-feature standardisation fitted on training rows only

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Zero-mean, unit-variance transform per feature column
///
/// NaN entries are ignored while fitting and map to 0.0 (the training mean)
/// when transforming. Columns with zero spread keep a scale of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or ragged matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let n_features = match rows.first() {
            Some(first) => first.len(),
            None => {
                return Err(PipelineError::InvalidInput(
                    "cannot fit a scaler on zero rows".to_string(),
                ))
            }
        };
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(PipelineError::InvalidInput(
                "rows differ in length".to_string(),
            ));
        }

        let mut mean = Vec::with_capacity(n_features);
        let mut scale = Vec::with_capacity(n_features);

        for col in 0..n_features {
            let observed: Vec<f64> = rows
                .iter()
                .map(|r| r[col])
                .filter(|v| !v.is_nan())
                .collect();
            if observed.is_empty() {
                mean.push(0.0);
                scale.push(1.0);
                continue;
            }
            let m = observed.iter().sum::<f64>() / observed.len() as f64;
            let var = observed.iter().map(|v| (v - m).powi(2)).sum::<f64>() / observed.len() as f64;
            let sd = var.sqrt();
            mean.push(m);
            scale.push(if sd > 0.0 && sd.is_finite() { sd } else { 1.0 });
        }

        Ok(Self { mean, scale })
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Fitted column means
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted column scales
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardise one row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(PipelineError::InvalidInput(format!(
                "row has {} features, scaler was fitted on {}",
                row.len(),
                self.mean.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&v, (&m, &s))| if v.is_nan() { 0.0 } else { (v - m) / s })
            .collect())
    }

    /// Standardise every row
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
