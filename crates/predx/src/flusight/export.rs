//! Writing FluSight submissions.

use std::io::Write;
use std::path::Path;

use crate::codec::csv::write_data_table;
use crate::codec::{ExportOptions, ExportSummary, write_atomically};
use crate::error::Result;
use crate::input::DataTable;
use crate::table::{PredxRecord, PredxTable};
use crate::value::{Predx, format_number};

use super::tables::{PERCENT_UPPER, Unit, target_unit, week_bin_end};
use super::{BIN_END, BIN_START, LOCATION, TARGET, TYPE, UNIT, VALUE};

const NA: &str = "NA";

/// Flatten a table into FluSight rows.
///
/// Binary and Sample values have no FluSight form and are skipped along
/// with failed records.
pub fn export_flusight(table: &PredxTable) -> (DataTable, ExportSummary) {
    let headers = [LOCATION, TARGET, TYPE, UNIT, BIN_START, BIN_END, VALUE]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut summary = ExportSummary::default();
    for record in table {
        let Some(value) = record.predx() else {
            summary.skipped += 1;
            continue;
        };

        let location = record.key_value(LOCATION).unwrap_or(NA);
        let target = record.key_value(TARGET).unwrap_or(NA);
        let row = |kind: &str, unit: &str, start: String, end: String, value: f64| {
            vec![
                location.to_string(),
                target.to_string(),
                kind.to_string(),
                unit.to_string(),
                start,
                end,
                format_number(value),
            ]
        };

        match value {
            Predx::Point(point) => {
                let unit = target_unit(target).map_or(NA, |u| u.name());
                rows.push(row("Point", unit, NA.into(), NA.into(), point.value()));
            }
            Predx::BinCat(bins) => {
                for (cat, prob) in bins.bins() {
                    let end = week_bin_end(cat).unwrap_or(NA).to_string();
                    rows.push(row("Bin", Unit::Week.name(), cat.clone(), end, *prob));
                }
            }
            Predx::BinLwr(bins) => {
                let bounds = bins.bins();
                for (idx, (lwr, prob)) in bounds.iter().enumerate() {
                    let end = bounds.get(idx + 1).map_or(PERCENT_UPPER, |(next, _)| *next);
                    rows.push(row(
                        "Bin",
                        Unit::Percent.name(),
                        format_number(*lwr),
                        format_number(end),
                        *prob,
                    ));
                }
            }
            Predx::Binary(_) | Predx::Sample(_) => {
                skip_unsupported(record);
                summary.skipped += 1;
                continue;
            }
        }
        summary.written += 1;
    }

    (DataTable::new(headers, rows), summary)
}

fn skip_unsupported(record: &PredxRecord) {
    tracing::warn!(
        class = %record.predx_class,
        key = ?record.key,
        "no FluSight form for this shape; record skipped"
    );
}

/// Write the table as FluSight CSV.
pub fn write_flusight<W: Write>(table: &PredxTable, writer: W) -> Result<ExportSummary> {
    let (data, summary) = export_flusight(table);
    write_data_table(&data, writer)?;
    summary.log("flusight");
    Ok(summary)
}

/// Write the table as a FluSight CSV file.
pub fn write_flusight_file(
    table: &PredxTable,
    path: impl AsRef<Path>,
    options: ExportOptions,
) -> Result<ExportSummary> {
    write_atomically(path, options, |writer| write_flusight(table, writer))
}
