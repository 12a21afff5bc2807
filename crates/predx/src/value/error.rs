//! Per-value and per-record error types.

use thiserror::Error;

/// Why a prediction value failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field holds a missing marker.
    #[error("NA(s) found in entry")]
    Missing,

    /// A probability lies outside `[0, 1]`.
    #[error("probability {prob} for bin '{bin}' is outside [0, 1]")]
    OutOfRange { bin: String, prob: f64 },

    /// Bin probabilities do not sum to one.
    #[error("probabilities sum to {sum}, expected ~1.0")]
    ProbabilitySum { sum: f64 },

    /// Two bins share a category or lower bound.
    #[error("duplicate {field} '{value}'")]
    DuplicateBin { field: &'static str, value: String },

    /// A binned value with no bins.
    #[error("no bins supplied")]
    EmptyBins,

    /// A sample with no draws.
    #[error("sample contains no draws")]
    EmptySample,

    /// An infinite number where a finite one is required.
    #[error("{0} is not finite")]
    NonFinite(String),
}

/// Failure attached to a single record of a predx table.
///
/// These never abort a batch: they travel in the record's value slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// The fields were read but do not form a valid value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The fields could not be read (unknown tag, missing or malformed field).
    #[error("format error: {0}")]
    Format(String),
}
