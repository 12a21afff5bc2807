//! Ingestion-time rescaling of bin probabilities.

use super::error::ValidationError;
use super::types::SUM_TOLERANCE;

/// Default band around 1.0 within which raw bin probabilities are rescaled
/// rather than rejected.
pub const NORMALIZE_BAND: f64 = 0.1;

/// Slack keeping the band edges inclusive under floating-point summation.
const BAND_SLACK: f64 = 1e-9;

/// Rescale `probs` so they sum to one.
///
/// Accepts sums in `[1 - band, 1 + band]`, inclusive at both ends. Sums
/// already within [`SUM_TOLERANCE`] of one are returned unchanged. Missing
/// entries fail before the sum is looked at.
pub fn normalize_probs(probs: &[f64], band: f64) -> Result<Vec<f64>, ValidationError> {
    if probs.iter().any(|p| p.is_nan()) {
        return Err(ValidationError::Missing);
    }

    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > band + BAND_SLACK {
        return Err(ValidationError::ProbabilitySum { sum });
    }
    if (sum - 1.0).abs() <= SUM_TOLERANCE {
        return Ok(probs.to_vec());
    }

    Ok(probs.iter().map(|p| p / sum).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(probs: &[f64]) -> f64 {
        probs.iter().sum()
    }

    #[test]
    fn test_rescales_within_band() {
        let probs = normalize_probs(&[0.25, 0.25, 0.45], NORMALIZE_BAND).unwrap();
        assert!((total(&probs) - 1.0).abs() <= SUM_TOLERANCE);
        assert!((probs[2] - 0.45 / 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let low = normalize_probs(&[0.45, 0.45], NORMALIZE_BAND).unwrap();
        assert!((total(&low) - 1.0).abs() <= SUM_TOLERANCE);

        let high = normalize_probs(&[0.55, 0.55], NORMALIZE_BAND).unwrap();
        assert!((total(&high) - 1.0).abs() <= SUM_TOLERANCE);
    }

    #[test]
    fn test_rejects_outside_band() {
        assert!(matches!(
            normalize_probs(&[0.445, 0.445], NORMALIZE_BAND),
            Err(ValidationError::ProbabilitySum { .. })
        ));
        assert!(matches!(
            normalize_probs(&[0.555, 0.555], NORMALIZE_BAND),
            Err(ValidationError::ProbabilitySum { .. })
        ));
    }

    #[test]
    fn test_missing_checked_first() {
        assert_eq!(
            normalize_probs(&[f64::NAN, 5.0], NORMALIZE_BAND),
            Err(ValidationError::Missing)
        );
    }

    #[test]
    fn test_normalized_input_unchanged() {
        let probs = [0.1, 0.2, 0.7];
        assert_eq!(normalize_probs(&probs, NORMALIZE_BAND).unwrap(), probs.to_vec());
    }

    #[test]
    fn test_custom_band() {
        assert!(normalize_probs(&[0.4, 0.4], 0.25).is_ok());
        assert!(normalize_probs(&[0.4, 0.4], NORMALIZE_BAND).is_err());
    }
}
