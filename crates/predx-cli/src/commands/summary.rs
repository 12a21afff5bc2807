//! Summary command - record counts by class and failed records.

use std::collections::BTreeMap;
use std::path::PathBuf;

use colored::Colorize;
use predx::PredxTable;

use crate::cli::Format;

pub fn run(
    file: PathBuf,
    from: Option<Format>,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = super::load_table(&file, from, false)?;
    let counts = count_by_class(&table);

    if json_output {
        let failures: Vec<serde_json::Value> = table
            .errors()
            .map(|(record, error)| {
                serde_json::json!({
                    "key": record.key,
                    "predx_class": record.predx_class,
                    "error": error.to_string(),
                })
            })
            .collect();
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "records": table.len(),
            "valid": table.valid_count(),
            "failed": table.error_count(),
            "by_class": counts,
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Summary for".cyan().bold(),
        file.display().to_string().white()
    );
    println!();
    println!(
        "Records: {} ({} valid, {} failed)",
        table.len().to_string().white().bold(),
        table.valid_count().to_string().green(),
        table.error_count().to_string().red()
    );
    println!();

    println!("{}", "By class:".yellow().bold());
    for (class, count) in &counts {
        println!("  {:<8} {}", class, count.to_string().white());
    }

    if table.error_count() > 0 {
        println!();
        println!("{}", "Failed records:".yellow().bold());
        for (record, error) in table.errors() {
            let key: Vec<String> = record
                .key
                .iter()
                .map(|(field, value)| format!("{}={}", field, value))
                .collect();
            println!(
                "  [{}] {} {}",
                record.predx_class.blue(),
                key.join(", "),
                error.to_string().red()
            );
        }
    }

    Ok(())
}

/// Records per variant tag, failed ones included.
fn count_by_class(table: &PredxTable) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in table {
        *counts.entry(record.predx_class.clone()).or_insert(0) += 1;
    }
    counts
}
