//! Verify command - diff a table against its expected predictions.

use std::path::{Path, PathBuf};

use colored::Colorize;
use predx::{ExpectedSpec, flusight, verify_expected};

use crate::cli::Format;

/// Name selecting the built-in FluSight specification.
const FLUSIGHT_SPEC: &str = "flusight";

/// How many keys of each kind to list before truncating.
const MAX_LISTED: usize = 20;

pub fn run(
    file: PathBuf,
    from: Option<Format>,
    expected: String,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = if expected.eq_ignore_ascii_case(FLUSIGHT_SPEC) {
        flusight::flusight_expected()
    } else {
        let path = Path::new(&expected);
        if !path.exists() {
            return Err(format!("Expected specification not found: {}", path.display()).into());
        }
        ExpectedSpec::from_file(path)?
    };

    let table = super::load_table(&file, from, false)?;
    let report = verify_expected(&table, &spec);

    if json_output {
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "records": table.len(),
            "failed_records": table.error_count(),
            "is_complete": report.is_complete(),
            "summary": report.summary(),
            "discrepancies": report.discrepancies(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Verification for".cyan().bold(),
        file.display().to_string().white()
    );
    println!();

    if report.is_complete() {
        println!("{} {}", "✓".green().bold(), report.summary().green());
        return Ok(());
    }

    println!("{} {}", "✗".red().bold(), report.summary().yellow());
    let limit = if verbose { usize::MAX } else { MAX_LISTED };

    if !report.missing.is_empty() {
        println!();
        println!("{}", "Missing:".yellow().bold());
        for key in report.missing.iter().take(limit) {
            println!("  {}", key.to_string().red());
        }
        print_truncated(report.missing.len(), limit);
    }

    if !report.unexpected.is_empty() {
        println!();
        println!("{}", "Unexpected:".yellow().bold());
        for key in report.unexpected.iter().take(limit) {
            println!("  {}", key.to_string().magenta());
        }
        print_truncated(report.unexpected.len(), limit);
    }

    if table.error_count() > 0 {
        println!();
        println!(
            "{} {} failed record(s) count as missing",
            "Note:".blue().bold(),
            table.error_count()
        );
    }

    Ok(())
}

fn print_truncated(total: usize, limit: usize) {
    if total > limit {
        println!(
            "  {} (use --verbose to list all)",
            format!("... and {} more", total - limit).dimmed()
        );
    }
}
