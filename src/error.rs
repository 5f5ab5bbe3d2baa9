//! Error types for seg-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for seg-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during segmentation evaluation and log scanning.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Prediction and ground-truth grids differ in dimensions.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Ground-truth dimensions (width, height).
        expected: (usize, usize),
        /// Prediction dimensions (width, height).
        actual: (usize, usize),
    },

    /// A class-index grid holds a value outside the palette.
    #[error("Class index out of range: {value} (expected 0-20)")]
    ClassOutOfRange {
        /// The offending value.
        value: u8,
    },

    /// A log line did not carry a score in the expected positional format.
    #[error("Score parse failed at line {line}: {text:?}")]
    ScoreParse {
        /// Zero-based line number within the log.
        line: usize,
        /// The raw line text.
        text: String,
    },

    /// A persisted confusion matrix is malformed.
    #[error("Confusion matrix format error at line {line}: {reason}")]
    MatrixFormat {
        /// One-based line number where the error occurred.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A log directory holds no regular files.
    #[error("Log file not found in {0}")]
    NoLogFiles(PathBuf),

    /// Failed to load or save an image file.
    #[error("Image load failed: {path}: {reason}")]
    ImageLoad {
        /// Path to the image that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid experiment configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML configuration error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
