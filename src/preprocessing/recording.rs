//! Multichannel recordings and CSV loading
//!
//! A recording is stored channel-major: one `Vec<f64>` per channel, all of
//! equal length. Missing samples are represented as NaN until imputation.

use std::path::Path;

use csv::ReaderBuilder;

use crate::config::ChannelConvention;
use crate::error::{PipelineError, Result};

/// A multichannel recording with a uniform sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    channels: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl Recording {
    /// Create a recording from named channels
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when names and data disagree in count or the
    /// channels have different lengths.
    pub fn new(channels: Vec<String>, data: Vec<Vec<f64>>) -> Result<Self> {
        if channels.len() != data.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} channel names for {} data columns",
                channels.len(),
                data.len()
            )));
        }
        if let Some(first) = data.first() {
            let n = first.len();
            if let Some(bad) = data.iter().position(|c| c.len() != n) {
                return Err(PipelineError::InvalidInput(format!(
                    "channel {} has {} samples, expected {}",
                    channels[bad],
                    data[bad].len(),
                    n
                )));
            }
        }
        Ok(Self { channels, data })
    }

    /// Channel names in storage order
    pub fn channel_names(&self) -> &[String] {
        &self.channels
    }

    /// Number of channels
    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    /// Number of samples per channel
    pub fn n_samples(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.data[index]
    }

    /// All channels, channel-major
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.data
    }

    /// Copy `len` samples of every channel starting at `start`
    pub fn slice(&self, start: usize, len: usize) -> Vec<Vec<f64>> {
        self.data
            .iter()
            .map(|c| c[start..start + len].to_vec())
            .collect()
    }
}

/// Locate the configured channels among the CSV header columns
///
/// Returns column indices in configured channel order together with the
/// convention that matched. `AutoDetect` tries exact names first and falls
/// back to lowercase names; it never mixes the two within one file.
pub fn resolve_columns(
    headers: &[String],
    channels: &[String],
    convention: ChannelConvention,
    path: &Path,
) -> Result<(Vec<usize>, ChannelConvention)> {
    let find_all = |lowercase: bool| -> Option<Vec<usize>> {
        channels
            .iter()
            .map(|name| {
                let wanted = if lowercase {
                    name.to_lowercase()
                } else {
                    name.clone()
                };
                headers.iter().position(|h| *h == wanted)
            })
            .collect()
    };

    let attempts: &[ChannelConvention] = match convention {
        ChannelConvention::Exact => &[ChannelConvention::Exact],
        ChannelConvention::Lowercase => &[ChannelConvention::Lowercase],
        ChannelConvention::AutoDetect => &[ChannelConvention::Exact, ChannelConvention::Lowercase],
    };

    for &attempt in attempts {
        if let Some(indices) = find_all(attempt == ChannelConvention::Lowercase) {
            return Ok((indices, attempt));
        }
    }

    let missing: Vec<&str> = channels
        .iter()
        .filter(|name| {
            !headers
                .iter()
                .any(|h| h == *name || *h == name.to_lowercase())
        })
        .map(String::as_str)
        .collect();

    Err(PipelineError::SchemaMismatch {
        path: path.to_path_buf(),
        message: format!(
            "expected {} channels under {:?}, missing {:?}",
            channels.len(),
            convention,
            missing
        ),
    })
}

fn parse_cell(cell: &str) -> std::result::Result<f64, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(f64::NAN),
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(format!("non-finite value {}", v)),
        Err(_) => Err(format!("non-numeric value {:?}", cell)),
    }
}

/// Load the configured channels from a CSV recording
///
/// Empty and `NaN` cells become NaN (missing) samples; any other
/// non-numeric cell or a row with the wrong number of fields is a
/// `ParseError`.
///
/// # Errors
///
/// `InvalidInput` for an empty channel list, `NotFound` if the file is
/// missing, `ParseError` for malformed content, `SchemaMismatch` if the
/// channels cannot be located.
pub fn load_csv(
    path: impl AsRef<Path>,
    channels: &[String],
    convention: ChannelConvention,
) -> Result<(Recording, ChannelConvention)> {
    if channels.is_empty() {
        return Err(PipelineError::InvalidInput(
            "no channels requested".to_string(),
        ));
    }
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let parse_err = |message: String| PipelineError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| parse_err(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_err(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let (columns, resolved) = resolve_columns(&headers, channels, convention, path)?;

    let mut data: Vec<Vec<f64>> = vec![Vec::new(); channels.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_err(format!("row {}: {}", row_idx + 1, e)))?;
        for (ch, &col) in columns.iter().enumerate() {
            let cell = record
                .get(col)
                .ok_or_else(|| parse_err(format!("row {} is missing column {}", row_idx + 1, col)))?;
            let value =
                parse_cell(cell).map_err(|m| parse_err(format!("row {}: {}", row_idx + 1, m)))?;
            data[ch].push(value);
        }
    }

    let n_samples = data.first().map_or(0, Vec::len);
    if n_samples == 0 {
        return Err(parse_err("no data rows".to_string()));
    }

    log::debug!(
        "Loaded {:?}: {} samples x {} channels ({:?})",
        path,
        n_samples,
        channels.len(),
        resolved
    );

    let names = channels.to_vec();
    Ok((Recording::new(names, data)?, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_exact_then_lowercase() {
        let channels = names(&["AF3", "F7"]);
        let path = PathBuf::from("x.csv");

        let upper = names(&["Time", "F7", "AF3"]);
        let (idx, conv) =
            resolve_columns(&upper, &channels, ChannelConvention::AutoDetect, &path).unwrap();
        assert_eq!(idx, vec![2, 1]);
        assert_eq!(conv, ChannelConvention::Exact);

        let lower = names(&["af3", "f7"]);
        let (idx, conv) =
            resolve_columns(&lower, &channels, ChannelConvention::AutoDetect, &path).unwrap();
        assert_eq!(idx, vec![0, 1]);
        assert_eq!(conv, ChannelConvention::Lowercase);
    }

    #[test]
    fn test_resolve_never_mixes_conventions() {
        let channels = names(&["AF3", "F7"]);
        let mixed = names(&["AF3", "f7"]);
        let result = resolve_columns(
            &mixed,
            &channels,
            ChannelConvention::AutoDetect,
            Path::new("m.csv"),
        );
        assert!(matches!(result, Err(PipelineError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_resolve_declared_convention_is_strict() {
        let channels = names(&["AF3"]);
        let lower = names(&["af3"]);
        let result = resolve_columns(&lower, &channels, ChannelConvention::Exact, Path::new("s.csv"));
        assert!(result.is_err(), "Exact convention must not fall back to lowercase");
    }

    #[test]
    fn test_parse_cell_missing_values() {
        assert!(parse_cell("").unwrap().is_nan());
        assert!(parse_cell(" NaN ").unwrap().is_nan());
        assert!(parse_cell("nan").unwrap().is_nan());
        assert_eq!(parse_cell("4.25").unwrap(), 4.25);
        assert!(parse_cell("abc").is_err());
        assert!(parse_cell("inf").is_err());
    }

    #[test]
    fn test_recording_rejects_ragged_channels() {
        let result = Recording::new(names(&["a", "b"]), vec![vec![1.0, 2.0], vec![1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_csv(
            "/definitely/not/here.csv",
            &names(&["AF3"]),
            ChannelConvention::AutoDetect,
        );
        assert!(matches!(result, Err(PipelineError::NotFound { .. })));
    }

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("eeg_gesture_rec_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_rejects_empty_channel_list() {
        let path = scratch_file("two_channels.csv", "AF3,F7\n1.0,2.0\n");
        let result = load_csv(&path, &[], ChannelConvention::AutoDetect);
        assert!(
            matches!(result, Err(PipelineError::InvalidInput(_))),
            "empty channel list should be rejected"
        );
    }

    #[test]
    fn test_load_header_only_is_parse_error() {
        let path = scratch_file("header_only.csv", "AF3,F7\n");
        match load_csv(&path, &names(&["AF3", "F7"]), ChannelConvention::AutoDetect) {
            Err(PipelineError::ParseError { message, .. }) => {
                assert!(message.contains("no data rows"), "message: {}", message)
            }
            other => panic!("expected ParseError, got {:?}", other.map(|(r, _)| r.n_samples())),
        }
    }
}
