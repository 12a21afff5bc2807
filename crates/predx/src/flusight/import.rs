//! Reading FluSight submissions.

use std::path::Path;

use crate::convert::{ConversionConfig, Converter};
use crate::error::{PredxError, Result};
use crate::input::{DataTable, Parser, is_missing};
use crate::table::PredxTable;
use crate::value::{NORMALIZE_BAND, PredxClass};

use super::tables::{Unit, target_unit, week_category};
use super::{BIN_START, LOCATION, TARGET, TYPE, UNIT, VALUE};

const NA: &str = "NA";

/// Convert a FluSight table into predx records.
///
/// Point rows become `Point` values. Bin rows group by location and target
/// into `BinCat` (week units) or `BinLwr` (percent units), with
/// probabilities rescaled when they sum to within 0.1 of one. Rows with an
/// unknown type or unit become failed records.
pub fn import_flusight(data: &DataTable) -> Result<PredxTable> {
    let column = |name: &str| {
        data.column_index(name)
            .ok_or_else(|| PredxError::MissingColumn(name.to_string()))
    };
    let location = column(LOCATION)?;
    let target = column(TARGET)?;
    let kind = column(TYPE)?;
    let unit = column(UNIT)?;
    let bin_start = column(BIN_START)?;
    let value = column(VALUE)?;

    let rows = data
        .rows
        .iter()
        .map(|row| {
            let cell = |idx: usize| row.get(idx).map(|s| s.as_str()).unwrap_or("");
            let tag = classify(cell(kind), cell(unit), cell(target));
            let (point, prob, cat, lwr): (String, String, String, String) = match tag.parse::<PredxClass>() {
                Ok(PredxClass::Point) => (cell(value).to_string(), NA.into(), NA.into(), NA.into()),
                Ok(PredxClass::BinCat) => (
                    NA.into(),
                    cell(value).to_string(),
                    week_category(cell(bin_start)),
                    NA.into(),
                ),
                Ok(PredxClass::BinLwr) => (
                    NA.into(),
                    cell(value).to_string(),
                    NA.into(),
                    cell(bin_start).to_string(),
                ),
                _ => (NA.into(), NA.into(), NA.into(), NA.into()),
            };
            vec![
                cell(location).to_string(),
                cell(target).to_string(),
                tag,
                point,
                prob,
                cat,
                lwr,
            ]
        })
        .collect();

    let interchange = DataTable::new(
        [LOCATION, TARGET, "predx_class", "point", "prob", "cat", "lwr"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows,
    );
    let config = ConversionConfig::default()
        .with_key_columns([LOCATION, TARGET])
        .with_normalize(NORMALIZE_BAND);
    Converter::with_config(config).convert(&interchange)
}

/// Variant tag for one row. Unknown combinations keep a descriptive tag
/// that fails conversion.
fn classify(kind: &str, unit: &str, target: &str) -> String {
    let kind = kind.trim();
    if kind.eq_ignore_ascii_case("point") {
        return PredxClass::Point.name().to_string();
    }
    if !kind.eq_ignore_ascii_case("bin") {
        return kind.to_string();
    }

    let resolved = if is_missing(unit) {
        target_unit(target)
    } else {
        Unit::parse(unit)
    };
    match resolved {
        Some(Unit::Week) => PredxClass::BinCat.name().to_string(),
        Some(Unit::Percent) => PredxClass::BinLwr.name().to_string(),
        None => format!("Bin ({})", unit.trim()),
    }
}

/// Read and import a FluSight CSV file.
pub fn read_flusight_file(path: impl AsRef<Path>) -> Result<PredxTable> {
    let data = Parser::new().parse_file(path)?;
    import_flusight(&data)
}
