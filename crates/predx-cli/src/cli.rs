//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// predx: convert and verify probabilistic forecast tables
#[derive(Parser)]
#[command(name = "predx")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a forecast table between formats
    Convert {
        /// Path to the input table
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input format (default: from the file extension)
        #[arg(long)]
        from: Option<Format>,

        /// Output format
        #[arg(long, default_value = "json")]
        to: Format,

        /// Output path (default: standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it exists
        #[arg(long)]
        force: bool,

        /// Rescale bin probabilities that sum to within 0.1 of one
        #[arg(long)]
        normalize: bool,
    },

    /// Check a table against the predictions it should contain
    Verify {
        /// Path to the table
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input format (default: from the file extension)
        #[arg(long)]
        from: Option<Format>,

        /// Expected specification: a JSON file, or "flusight"
        #[arg(short, long, value_name = "SPEC")]
        expected: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show record counts by class and the failed records
    Summary {
        /// Path to the table
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input format (default: from the file extension)
        #[arg(long)]
        from: Option<Format>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Table file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Csv,
    #[default]
    Json,
    Flusight,
}

impl Format {
    /// Guess from a file extension: `.json` is JSON, anything else CSV.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Csv,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "flusight" => Ok(Format::Flusight),
            _ => Err(format!("Unknown format: {}. Use csv, json, or flusight.", s)),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Csv => write!(f, "csv"),
            Format::Json => write!(f, "json"),
            Format::Flusight => write!(f, "flusight"),
        }
    }
}
