//! Static lookup tables for the FluSight dialect.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Locations forecast in each submission.
pub const LOCATIONS: [&str; 11] = [
    "US National",
    "HHS Region 1",
    "HHS Region 2",
    "HHS Region 3",
    "HHS Region 4",
    "HHS Region 5",
    "HHS Region 6",
    "HHS Region 7",
    "HHS Region 8",
    "HHS Region 9",
    "HHS Region 10",
];

/// Targets forecast for each location.
pub const TARGETS: [&str; 7] = [
    "Season onset",
    "Season peak week",
    "Season peak percentage",
    "1 wk ahead",
    "2 wk ahead",
    "3 wk ahead",
    "4 wk ahead",
];

/// Onset category for seasons without an onset.
pub const NO_ONSET: &str = "none";

/// Exclusive upper end of the last percent bin.
pub const PERCENT_UPPER: f64 = 100.0;

/// Unit a target is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// MMWR week; binned categorically.
    Week,
    /// Weighted ILI percentage; binned by lower bound.
    Percent,
}

impl Unit {
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Week => "week",
            Unit::Percent => "percent",
        }
    }

    /// Parse a unit cell. Case-insensitive.
    pub fn parse(raw: &str) -> Option<Unit> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" => Some(Unit::Week),
            "percent" => Some(Unit::Percent),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static WEEK_AHEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+ wk ahead$").expect("week-ahead pattern is valid"));

/// Week bins in season order: MMWR weeks 40-52, 1-20, then no onset.
static WEEK_BINS: Lazy<Vec<String>> = Lazy::new(|| {
    (40..=52)
        .chain(1..=20)
        .map(|week: u32| week.to_string())
        .chain(std::iter::once(NO_ONSET.to_string()))
        .collect()
});

// Exclusive end of each week bin.
static WEEK_BIN_END: Lazy<HashMap<&'static str, String>> = Lazy::new(|| {
    WEEK_BINS
        .iter()
        .map(|bin| {
            let end = match bin.parse::<u32>() {
                Ok(week) => (week + 1).to_string(),
                Err(_) => NO_ONSET.to_string(),
            };
            (bin.as_str(), end)
        })
        .collect()
});

/// Percent bin lower bounds: 0.0 to 13.0 in steps of 0.1.
static PERCENT_BINS: Lazy<Vec<f64>> =
    Lazy::new(|| (0..=130).map(|tenths: u32| f64::from(tenths) / 10.0).collect());

/// Unit of a target, if the target is known.
pub fn target_unit(target: &str) -> Option<Unit> {
    match target.trim() {
        "Season onset" | "Season peak week" => Some(Unit::Week),
        "Season peak percentage" => Some(Unit::Percent),
        other if WEEK_AHEAD.is_match(other) => Some(Unit::Percent),
        _ => None,
    }
}

/// Every week bin, ending with [`NO_ONSET`].
pub fn week_bins() -> &'static [String] {
    &WEEK_BINS
}

/// Exclusive end of a week bin, or `None` for an unknown bin.
pub fn week_bin_end(bin: &str) -> Option<&'static str> {
    WEEK_BIN_END.get(bin.trim()).map(|end| end.as_str())
}

/// Every percent bin lower bound, ascending.
pub fn percent_bins() -> &'static [f64] {
    &PERCENT_BINS
}

/// Canonical week category: `40.0` reads as `40`, `None` as `none`.
pub fn week_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(NO_ONSET) {
        return NO_ONSET.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(week) if week.fract() == 0.0 && (0.0..=53.0).contains(&week) => {
            format!("{}", week as u32)
        }
        _ => trimmed.to_string(),
    }
}
