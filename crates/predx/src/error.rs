//! Error types for the predx library.
//!
//! These are the batch-level failures that abort a whole call. Failures
//! scoped to a single prediction are carried as data instead; see
//! [`RecordError`](crate::value::RecordError).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for predx operations.
#[derive(Debug, Error)]
pub enum PredxError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error reading or writing a stream that has no path.
    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Export destination already exists and overwrite was not requested.
    #[error("File already exists: '{0}' (pass overwrite to replace it)")]
    FileExists(PathBuf),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rows meant to aggregate into one record disagree on a shared key column.
    #[error("Ambiguous grouping on column '{column}': rows disagree ('{first}' vs '{second}')")]
    Grouping {
        column: String,
        first: String,
        second: String,
    },

    /// A column required by the configuration is not in the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Empty file or no columns to read.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for predx operations.
pub type Result<T> = std::result::Result<T, PredxError>;
