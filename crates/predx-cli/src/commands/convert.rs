//! Convert command - read a table in one format and write it in another.

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use predx::codec::{self, csv, json};
use predx::{ExportOptions, ExportSummary, PredxTable, flusight};

use crate::cli::Format;

pub fn run(
    file: PathBuf,
    from: Option<Format>,
    to: Format,
    output: Option<PathBuf>,
    force: bool,
    normalize: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = super::load_table(&file, from, normalize)?;

    let summary = match &output {
        Some(path) => {
            let options = ExportOptions { overwrite: force };
            match to {
                Format::Csv => codec::write_csv_file(&table, path, options)?,
                Format::Json => codec::write_json_file(&table, path, options)?,
                Format::Flusight => flusight::write_flusight_file(&table, path, options)?,
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let summary = write_to(&table, to, &mut handle)?;
            if to == Format::Json {
                writeln!(handle)?;
            }
            summary
        }
    };

    // Status goes to stderr; stdout may hold the table
    eprintln!(
        "{} {} record(s) as {}",
        "Wrote".green().bold(),
        summary.written.to_string().white().bold(),
        to
    );
    if let Some(path) = &output {
        eprintln!("  to {}", path.display().to_string().cyan());
    }
    if summary.skipped > 0 {
        eprintln!(
            "  {} {} record(s) skipped (failed, or no {} form)",
            "Warning:".yellow().bold(),
            summary.skipped,
            to
        );
    }
    if table.error_count() > 0 {
        eprintln!(
            "  {} record(s) failed conversion; run 'predx summary {}' for details",
            table.error_count().to_string().red(),
            file.display()
        );
    }

    Ok(())
}

fn write_to(
    table: &PredxTable,
    format: Format,
    writer: &mut impl Write,
) -> predx::Result<ExportSummary> {
    match format {
        Format::Csv => csv::write_csv(table, writer),
        Format::Json => json::write_json(table, writer),
        Format::Flusight => flusight::write_flusight(table, writer),
    }
}
