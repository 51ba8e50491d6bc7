//! Stratified train/test split

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// Row indices of a train/test partition, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Training rows
    pub train: Vec<usize>,
    /// Held-out rows
    pub test: Vec<usize>,
}

/// Partition rows so each class keeps its proportion in both halves
///
/// Each class is shuffled with a generator seeded once from `seed`, and
/// `round(n_c * test_fraction)` of its rows go to the test side. A class with
/// at least two rows always contributes one row to each side; a singleton
/// class stays in training.
///
/// # Errors
///
/// Returns `InvalidInput` if `test_fraction` is outside `(0, 1)` or no class
/// has enough rows to hold any out.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidInput(format!(
            "test fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (_, mut rows) in by_class {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    if test.is_empty() {
        return Err(PipelineError::InvalidInput(
            "too few rows per class for a held-out split".to_string(),
        ));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
