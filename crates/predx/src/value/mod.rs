//! Prediction value types and their validity rules.
//!
//! Every value is built through a validating constructor and is immutable
//! afterwards, so holding a [`Predx`] means holding a valid prediction.

mod error;
mod normalize;
mod types;

pub use error::{RecordError, ValidationError};
pub use normalize::{NORMALIZE_BAND, normalize_probs};
pub use types::{BinCat, BinLwr, Binary, Point, Predx, PredxClass, SUM_TOLERANCE, Sample};

/// Render a number the way it is written to interchange files and keys.
///
/// Uses the shortest representation that parses back to the same value.
pub fn format_number(value: f64) -> String {
    value.to_string()
}
