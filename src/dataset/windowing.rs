//! Sliding-window segmentation of a recording

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::preprocessing::recording::Recording;

/// Number of full windows of `window_len` samples, `step` apart, in `n_samples`
///
/// `max(0, floor((n_samples - window_len) / step) + 1)`. The trailing
/// partial window is discarded. A zero step yields no windows.
pub fn window_count(n_samples: usize, window_len: usize, step: usize) -> usize {
    if step == 0 || window_len == 0 || n_samples < window_len {
        return 0;
    }
    (n_samples - window_len) / step + 1
}

/// Start sample of every window, in order
pub fn window_starts(n_samples: usize, window_len: usize, step: usize) -> impl Iterator<Item = usize> {
    (0..window_count(n_samples, window_len, step)).map(move |i| i * step)
}

/// One labeled window cut from a recording
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Channel-major samples, `data[channel][sample]`
    pub data: Vec<Vec<f64>>,
    /// Ground-truth class label
    pub label: u8,
    /// Recording the window was cut from
    pub source: Arc<PathBuf>,
    /// Index of the first sample within the recording
    pub start: usize,
}

impl Window {
    /// Source file path
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// True when the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cut every full window from a recording
pub fn segment(
    recording: &Recording,
    window_len: usize,
    step: usize,
    label: u8,
    source: &Path,
) -> Vec<Window> {
    let source = Arc::new(source.to_path_buf());
    window_starts(recording.n_samples(), window_len, step)
        .map(|start| Window {
            data: recording.slice(start, window_len),
            label,
            source: Arc::clone(&source),
            start,
        })
        .collect()
}
