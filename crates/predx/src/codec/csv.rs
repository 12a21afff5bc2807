//! Flattened CSV interchange form.
//!
//! Columns are the key fields, `predx_class`, then whichever of `point`,
//! `prob`, `cat`, `lwr` and `sample` the table's shapes need. Each scalar,
//! bin or draw takes one row; unused value cells hold `NA`. A record without
//! one of the table's key fields leaves that cell empty.

use std::io::{self, Read, Write};

use crate::convert::{ConversionConfig, Converter, VALUE_COLUMNS};
use crate::error::{PredxError, Result};
use crate::input::{DataTable, Parser, ParserConfig};
use crate::table::PredxTable;
use crate::value::{Predx, format_number};

use super::ExportSummary;

const NA: &str = "NA";
const CLASS_COLUMN: &str = "predx_class";

/// Flatten a table into interchange rows.
pub fn to_data_table(table: &PredxTable) -> (DataTable, ExportSummary) {
    let key_columns = table.key_columns();
    let value_columns: Vec<&str> = VALUE_COLUMNS
        .iter()
        .copied()
        .filter(|column| {
            table
                .valid()
                .any(|(_, value)| value.class().value_columns().contains(column))
        })
        .collect();

    let mut headers: Vec<String> = key_columns.iter().map(|c| c.to_string()).collect();
    headers.push(CLASS_COLUMN.to_string());
    headers.extend(value_columns.iter().map(|c| c.to_string()));

    let mut rows = Vec::new();
    let mut summary = ExportSummary::default();
    for record in table {
        let Some(value) = record.predx() else {
            summary.skipped += 1;
            continue;
        };
        summary.written += 1;

        for cells in value_cells(value) {
            let mut row: Vec<String> = key_columns
                .iter()
                .map(|c| record.key_value(c).unwrap_or_default().to_string())
                .collect();
            row.push(record.predx_class.clone());
            row.extend(value_columns.iter().map(|column| {
                cells
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, cell)| cell.clone())
                    .unwrap_or_else(|| NA.to_string())
            }));
            rows.push(row);
        }
    }

    (DataTable::new(headers, rows), summary)
}

/// Cells for each interchange row of one value.
fn value_cells(value: &Predx) -> Vec<Vec<(&'static str, String)>> {
    match value {
        Predx::Point(point) => vec![vec![("point", format_number(point.value()))]],
        Predx::Binary(binary) => vec![vec![("prob", format_number(binary.prob()))]],
        Predx::BinCat(bins) => bins
            .bins()
            .iter()
            .map(|(cat, prob)| vec![("cat", cat.clone()), ("prob", format_number(*prob))])
            .collect(),
        Predx::BinLwr(bins) => bins
            .bins()
            .iter()
            .map(|(lwr, prob)| {
                vec![("lwr", format_number(*lwr)), ("prob", format_number(*prob))]
            })
            .collect(),
        Predx::Sample(sample) => sample
            .draws()
            .iter()
            .map(|draw| vec![("sample", format_number(*draw))])
            .collect(),
    }
}

/// Write the table as CSV.
pub fn write_csv<W: Write>(table: &PredxTable, writer: W) -> Result<ExportSummary> {
    let (data, summary) = to_data_table(table);
    write_data_table(&data, writer)?;
    summary.log("csv");
    Ok(summary)
}

/// Write raw rows as CSV with a header line.
pub(crate) fn write_data_table<W: Write>(data: &DataTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&data.headers)?;
    for row in &data.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the table as a CSV string.
pub fn to_csv_string(table: &PredxTable) -> Result<(String, ExportSummary)> {
    let mut buffer = Vec::new();
    let summary = write_csv(table, &mut buffer)?;
    let text = String::from_utf8(buffer)
        .map_err(|e| PredxError::Stream(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok((text, summary))
}

/// Rebuild a table from interchange rows.
///
/// Every column other than `predx_class` and the value columns is a key
/// column. Per-record problems land in the records' error slots.
pub fn from_data_table(data: &DataTable) -> Result<PredxTable> {
    from_data_table_with(data, ConversionConfig::default())
}

/// Rebuild a table using `config` for everything but the key columns,
/// which always come from the headers.
pub fn from_data_table_with(data: &DataTable, config: ConversionConfig) -> Result<PredxTable> {
    if data.column_index(CLASS_COLUMN).is_none() {
        return Err(PredxError::MissingColumn(CLASS_COLUMN.to_string()));
    }

    let key_columns: Vec<&str> = data
        .headers
        .iter()
        .map(|h| h.as_str())
        .filter(|h| *h != CLASS_COLUMN && !VALUE_COLUMNS.contains(h))
        .collect();

    let config = ConversionConfig {
        class_column: CLASS_COLUMN.to_string(),
        ..config.with_key_columns(key_columns)
    };
    Converter::with_config(config).convert(data)
}

/// Read a comma-separated interchange table.
pub fn read_csv<R: Read>(reader: R) -> Result<PredxTable> {
    let parser = Parser::with_config(ParserConfig {
        delimiter: Some(b','),
        ..ParserConfig::default()
    });
    let data = parser.parse_reader(reader)?;
    from_data_table(&data)
}
