//! The five prediction shapes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::input::is_missing;

use super::error::{RecordError, ValidationError};
use super::format_number;

/// Maximum distance from 1.0 allowed for the probabilities of a constructed
/// binned value.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Variant tag naming a prediction shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PredxClass {
    /// A single point estimate.
    Point,
    /// Probability of a yes/no event.
    Binary,
    /// Probabilities over named categories.
    BinCat,
    /// Probabilities over numeric bins identified by their lower bound.
    BinLwr,
    /// Draws from a predictive distribution.
    Sample,
}

impl PredxClass {
    /// All classes, in declaration order.
    pub const ALL: [PredxClass; 5] = [
        PredxClass::Point,
        PredxClass::Binary,
        PredxClass::BinCat,
        PredxClass::BinLwr,
        PredxClass::Sample,
    ];

    /// The tag as written in interchange files.
    pub fn name(&self) -> &'static str {
        match self {
            PredxClass::Point => "Point",
            PredxClass::Binary => "Binary",
            PredxClass::BinCat => "BinCat",
            PredxClass::BinLwr => "BinLwr",
            PredxClass::Sample => "Sample",
        }
    }

    /// Interchange columns that carry this class's payload.
    pub fn value_columns(&self) -> &'static [&'static str] {
        match self {
            PredxClass::Point => &["point"],
            PredxClass::Binary => &["prob"],
            PredxClass::BinCat => &["cat", "prob"],
            PredxClass::BinLwr => &["lwr", "prob"],
            PredxClass::Sample => &["sample"],
        }
    }

    /// Whether one value spans several input rows.
    pub fn is_multi_row(&self) -> bool {
        matches!(
            self,
            PredxClass::BinCat | PredxClass::BinLwr | PredxClass::Sample
        )
    }
}

impl fmt::Display for PredxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PredxClass {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PredxClass::ALL
            .into_iter()
            .find(|class| class.name() == trimmed)
            .ok_or_else(|| RecordError::Format(format!("unknown predx_class '{}'", trimmed)))
    }
}

/// A point estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    value: f64,
}

impl Point {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::Missing);
        }
        require_finite("point", value)?;
        Ok(Self { value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Probability of a binary event.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    prob: f64,
}

impl Binary {
    pub fn new(prob: f64) -> Result<Self, ValidationError> {
        if prob.is_nan() {
            return Err(ValidationError::Missing);
        }
        check_probability("prob", prob)?;
        Ok(Self { prob })
    }

    pub fn prob(&self) -> f64 {
        self.prob
    }
}

/// Probabilities over named categories, kept in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BinCat {
    bins: Vec<(String, f64)>,
}

impl BinCat {
    /// Build from `(category, probability)` pairs.
    ///
    /// Categories are trimmed, must be unique and the probabilities must
    /// sum to one within [`SUM_TOLERANCE`].
    pub fn new(bins: Vec<(String, f64)>) -> Result<Self, ValidationError> {
        let bins: Vec<(String, f64)> = bins
            .into_iter()
            .map(|(cat, prob)| (cat.trim().to_string(), prob))
            .collect();
        if bins.iter().any(|(cat, prob)| is_missing(cat) || prob.is_nan()) {
            return Err(ValidationError::Missing);
        }
        if bins.is_empty() {
            return Err(ValidationError::EmptyBins);
        }

        let mut seen = HashSet::new();
        for (cat, _) in &bins {
            if !seen.insert(cat.as_str()) {
                return Err(ValidationError::DuplicateBin {
                    field: "category",
                    value: cat.clone(),
                });
            }
        }

        for (cat, prob) in &bins {
            check_probability(cat, *prob)?;
        }
        check_sum(bins.iter().map(|(_, prob)| *prob))?;

        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[(String, f64)] {
        &self.bins
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.bins.iter().map(|(cat, _)| cat.as_str())
    }

    /// Probability assigned to `cat`, if it is one of the bins.
    pub fn prob_of(&self, cat: &str) -> Option<f64> {
        self.bins.iter().find(|(c, _)| c == cat).map(|(_, p)| *p)
    }
}

/// Probabilities over numeric bins, sorted ascending by lower bound.
///
/// Each bin covers `[lwr, next lwr)`; the upper end of the last bin is not
/// part of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct BinLwr {
    bins: Vec<(f64, f64)>,
}

impl BinLwr {
    /// Build from `(lower bound, probability)` pairs in any order.
    pub fn new(mut bins: Vec<(f64, f64)>) -> Result<Self, ValidationError> {
        if bins.iter().any(|(lwr, prob)| lwr.is_nan() || prob.is_nan()) {
            return Err(ValidationError::Missing);
        }
        if bins.is_empty() {
            return Err(ValidationError::EmptyBins);
        }
        for (lwr, _) in &bins {
            require_finite("lower bound", *lwr)?;
        }

        bins.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = bins.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ValidationError::DuplicateBin {
                field: "lower bound",
                value: format_number(pair[0].0),
            });
        }

        for (lwr, prob) in &bins {
            check_probability(&format_number(*lwr), *prob)?;
        }
        check_sum(bins.iter().map(|(_, prob)| *prob))?;

        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[(f64, f64)] {
        &self.bins
    }

    pub fn lower_bounds(&self) -> impl Iterator<Item = f64> + '_ {
        self.bins.iter().map(|(lwr, _)| *lwr)
    }
}

/// Draws from a predictive distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    draws: Vec<f64>,
}

impl Sample {
    pub fn new(draws: Vec<f64>) -> Result<Self, ValidationError> {
        if draws.iter().any(|d| d.is_nan()) {
            return Err(ValidationError::Missing);
        }
        if draws.is_empty() {
            return Err(ValidationError::EmptySample);
        }
        for draw in &draws {
            require_finite("sample draw", *draw)?;
        }
        Ok(Self { draws })
    }

    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Always false for a constructed sample.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// A validated prediction of any shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Predx {
    Point(Point),
    Binary(Binary),
    BinCat(BinCat),
    BinLwr(BinLwr),
    Sample(Sample),
}

impl Predx {
    /// The variant tag of this value.
    pub fn class(&self) -> PredxClass {
        match self {
            Predx::Point(_) => PredxClass::Point,
            Predx::Binary(_) => PredxClass::Binary,
            Predx::BinCat(_) => PredxClass::BinCat,
            Predx::BinLwr(_) => PredxClass::BinLwr,
            Predx::Sample(_) => PredxClass::Sample,
        }
    }
}

impl From<Point> for Predx {
    fn from(value: Point) -> Self {
        Predx::Point(value)
    }
}

impl From<Binary> for Predx {
    fn from(value: Binary) -> Self {
        Predx::Binary(value)
    }
}

impl From<BinCat> for Predx {
    fn from(value: BinCat) -> Self {
        Predx::BinCat(value)
    }
}

impl From<BinLwr> for Predx {
    fn from(value: BinLwr) -> Self {
        Predx::BinLwr(value)
    }
}

impl From<Sample> for Predx {
    fn from(value: Sample) -> Self {
        Predx::Sample(value)
    }
}

fn check_probability(bin: &str, prob: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&prob) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            bin: bin.to_string(),
            prob,
        })
    }
}

fn check_sum(probs: impl Iterator<Item = f64>) -> Result<(), ValidationError> {
    let sum: f64 = probs.sum();
    if (sum - 1.0).abs() <= SUM_TOLERANCE {
        Ok(())
    } else {
        Err(ValidationError::ProbabilitySum { sum })
    }
}

fn require_finite(what: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(format!(
            "{} {}",
            what,
            format_number(value)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_bins(bins: &[(&str, f64)]) -> Vec<(String, f64)> {
        bins.iter().map(|(c, p)| (c.to_string(), *p)).collect()
    }

    #[test]
    fn test_class_names_round_trip() {
        for class in PredxClass::ALL {
            assert_eq!(class.name().parse::<PredxClass>().unwrap(), class);
        }
        assert!(matches!(
            "Quantile".parse::<PredxClass>(),
            Err(RecordError::Format(_))
        ));
    }

    #[test]
    fn test_point_missing() {
        assert_eq!(Point::new(f64::NAN), Err(ValidationError::Missing));
        assert_eq!(Point::new(3.5).unwrap().value(), 3.5);
        assert!(matches!(
            Point::new(f64::INFINITY),
            Err(ValidationError::NonFinite(_))
        ));
    }

    #[test]
    fn test_binary_out_of_range() {
        let err = Binary::new(1.5).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { prob, .. } if prob == 1.5));
        assert!(Binary::new(-0.1).is_err());
        assert_eq!(Binary::new(f64::NAN), Err(ValidationError::Missing));
        assert_eq!(Binary::new(1.0).unwrap().prob(), 1.0);
        assert_eq!(Binary::new(0.0).unwrap().prob(), 0.0);
    }

    #[test]
    fn test_bincat_keeps_input_order() {
        let value = BinCat::new(cat_bins(&[("42", 0.2), ("none", 0.5), ("40", 0.3)])).unwrap();
        assert_eq!(value.categories().collect::<Vec<_>>(), vec!["42", "none", "40"]);
        assert_eq!(value.prob_of("none"), Some(0.5));
        assert_eq!(value.prob_of("41"), None);
    }

    #[test]
    fn test_bincat_duplicate_category() {
        let err = BinCat::new(cat_bins(&[("a", 0.5), ("a", 0.5)])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateBin {
                field: "category",
                value: "a".to_string()
            }
        );
        assert_eq!(err.to_string(), "duplicate category 'a'");
    }

    #[test]
    fn test_bincat_padded_categories_are_trimmed() {
        let bins = BinCat::new(cat_bins(&[(" none ", 0.5), ("40", 0.5)])).unwrap();
        assert_eq!(bins.categories().collect::<Vec<_>>(), vec!["none", "40"]);

        let err = BinCat::new(cat_bins(&[(" a", 0.5), ("a", 0.5)])).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateBin { .. }));
    }

    #[test]
    fn test_bincat_missing_category_before_sum() {
        // Sum is wrong too, but the missing check comes first
        let err = BinCat::new(cat_bins(&[("NA", 0.2), ("b", 0.2)])).unwrap_err();
        assert_eq!(err, ValidationError::Missing);
    }

    #[test]
    fn test_bincat_sum_out_of_tolerance() {
        let err = BinCat::new(cat_bins(&[("a", 0.2), ("b", 0.22)])).unwrap_err();
        assert!(matches!(err, ValidationError::ProbabilitySum { sum } if (sum - 0.42).abs() < 1e-12));
        assert!(err.to_string().starts_with("probabilities sum to 0.42"));
    }

    #[test]
    fn test_bincat_sum_within_tolerance() {
        assert!(BinCat::new(cat_bins(&[("a", 0.5), ("b", 0.5000005)])).is_ok());
        assert!(BinCat::new(cat_bins(&[("a", 0.5), ("b", 0.50001)])).is_err());
    }

    #[test]
    fn test_bincat_out_of_range_names_bin() {
        let err = BinCat::new(cat_bins(&[("low", -0.5), ("high", 1.5)])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                bin: "low".to_string(),
                prob: -0.5
            }
        );
    }

    #[test]
    fn test_empty_bins() {
        assert_eq!(BinCat::new(Vec::new()), Err(ValidationError::EmptyBins));
        assert_eq!(BinLwr::new(Vec::new()), Err(ValidationError::EmptyBins));
    }

    #[test]
    fn test_binlwr_sorted_on_construction() {
        let value = BinLwr::new(vec![(0.3, 0.5), (0.1, 0.2), (0.2, 0.3)]).unwrap();
        assert_eq!(value.bins(), &[(0.1, 0.2), (0.2, 0.3), (0.3, 0.5)]);
        assert_eq!(value.lower_bounds().collect::<Vec<_>>(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_binlwr_duplicate_bound() {
        let err = BinLwr::new(vec![(1.0, 0.5), (1.0, 0.5)]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateBin {
                field: "lower bound",
                value: "1".to_string()
            }
        );
    }

    #[test]
    fn test_binlwr_rejects_infinite_bound() {
        let err = BinLwr::new(vec![(f64::NEG_INFINITY, 1.0)]).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite(_)));
    }

    #[test]
    fn test_sample() {
        assert_eq!(Sample::new(Vec::new()), Err(ValidationError::EmptySample));
        assert_eq!(
            Sample::new(vec![1.0, f64::NAN]),
            Err(ValidationError::Missing)
        );
        let sample = Sample::new(vec![1.0, 2.5, 2.5]).unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.draws(), &[1.0, 2.5, 2.5]);
    }

    #[test]
    fn test_predx_class_dispatch() {
        let value: Predx = Binary::new(0.3).unwrap().into();
        assert_eq!(value.class(), PredxClass::Binary);
        let value: Predx = Sample::new(vec![1.0]).unwrap().into();
        assert_eq!(value.class(), PredxClass::Sample);
        assert!(PredxClass::Sample.is_multi_row());
        assert!(!PredxClass::Point.is_multi_row());
    }
}
