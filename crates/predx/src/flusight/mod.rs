//! FluSight challenge dialect.
//!
//! Submissions are long tables with one row per point estimate or bin:
//!
//! | column | meaning |
//! |---|---|
//! | `location`, `target` | what is forecast |
//! | `type` | `Point` or `Bin` |
//! | `unit` | `week` or `percent` |
//! | `bin_start_incl`, `bin_end_notincl` | bin bounds, `NA` for points |
//! | `value` | point estimate or bin probability |
//!
//! Week bins map to [`BinCat`](crate::value::BinCat) values and percent bins
//! to [`BinLwr`](crate::value::BinLwr) values.

mod export;
mod import;
pub mod tables;

pub use export::{export_flusight, write_flusight, write_flusight_file};
pub use import::{import_flusight, read_flusight_file};

use crate::value::{PredxClass, format_number};
use crate::verify::{CAT_FIELD, CLASS_FIELD, ExpectedSpec, LWR_FIELD, RequirementBlock};

use tables::{LOCATIONS, NO_ONSET, TARGETS, Unit, percent_bins, target_unit, week_bins};

pub const LOCATION: &str = "location";
pub const TARGET: &str = "target";
pub const TYPE: &str = "type";
pub const UNIT: &str = "unit";
pub const BIN_START: &str = "bin_start_incl";
pub const BIN_END: &str = "bin_end_notincl";
pub const VALUE: &str = "value";

/// Everything a complete FluSight submission contains: a point estimate for
/// every location and target, plus the full bin set of each target.
pub fn flusight_expected() -> ExpectedSpec {
    let percent_targets: Vec<&str> = TARGETS
        .iter()
        .copied()
        .filter(|target| target_unit(target) == Some(Unit::Percent))
        .collect();
    let peak_weeks = week_bins().iter().filter(|bin| bin.as_str() != NO_ONSET);
    let lower_bounds = percent_bins().iter().map(|lwr| format_number(*lwr));

    ExpectedSpec::new(vec![
        RequirementBlock::new()
            .field(LOCATION, LOCATIONS)
            .field(TARGET, TARGETS)
            .field(CLASS_FIELD, [PredxClass::Point.name()]),
        RequirementBlock::new()
            .field(LOCATION, LOCATIONS)
            .field(TARGET, ["Season onset"])
            .field(CLASS_FIELD, [PredxClass::BinCat.name()])
            .field(CAT_FIELD, week_bins()),
        RequirementBlock::new()
            .field(LOCATION, LOCATIONS)
            .field(TARGET, ["Season peak week"])
            .field(CLASS_FIELD, [PredxClass::BinCat.name()])
            .field(CAT_FIELD, peak_weeks),
        RequirementBlock::new()
            .field(LOCATION, LOCATIONS)
            .field(TARGET, percent_targets)
            .field(CLASS_FIELD, [PredxClass::BinLwr.name()])
            .field(LWR_FIELD, lower_bounds),
    ])
}
