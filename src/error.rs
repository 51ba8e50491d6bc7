//! Error types for the EEG gesture pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, processing or classifying recordings
#[derive(Debug, Error)]
pub enum PipelineError {
    /// File or directory does not exist
    #[error("not found: {}", path.display())]
    NotFound {
        /// Missing path
        path: PathBuf,
    },

    /// Unreadable or malformed tabular data
    #[error("parse error in {}: {message}", path.display())]
    ParseError {
        /// Offending file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Required channels are absent, or a file disagrees with the dataset convention
    #[error("schema mismatch in {}: {message}", path.display())]
    SchemaMismatch {
        /// Offending file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// A feature is mathematically undefined for a degenerate window
    ///
    /// Raised inside per-channel computation and converted to NaN sentinels
    /// by the extractor; it never escapes a feature vector.
    #[error("numerically indeterminate: {0}")]
    NumericIndeterminate(String),

    /// Zero usable windows after scanning the whole corpus
    #[error("dataset is empty: no windows were produced")]
    EmptyDataset,

    /// Invalid parameters or input shape
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the dataset builder may log and skip the file that produced this error
    ///
    /// Convention conflicts between files are reported as `SchemaMismatch` too,
    /// but the builder raises those itself and never routes them through here.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            PipelineError::NotFound { .. }
                | PipelineError::ParseError { .. }
                | PipelineError::SchemaMismatch { .. }
                | PipelineError::Io(_)
        )
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_file_classification() {
        let parse = PipelineError::ParseError {
            path: PathBuf::from("a.csv"),
            message: "bad cell".to_string(),
        };
        assert!(parse.is_per_file());
        assert!(!PipelineError::EmptyDataset.is_per_file());
        assert!(!PipelineError::InvalidInput("x".to_string()).is_per_file());
    }

    #[test]
    fn test_display_mentions_path() {
        let err = PipelineError::NotFound {
            path: PathBuf::from("/data/open/s1.csv"),
        };
        assert!(err.to_string().contains("s1.csv"), "got: {}", err);
    }
}
