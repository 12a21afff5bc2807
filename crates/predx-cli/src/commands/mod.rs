//! CLI command implementations.

pub mod convert;
pub mod summary;
pub mod verify;

use std::path::Path;

use predx::codec::{self, csv};
use predx::value::NORMALIZE_BAND;
use predx::{ConversionConfig, Parser, PredxTable, flusight};

use crate::cli::Format;

/// Load a table in `format`, or in the format the extension suggests.
pub fn load_table(
    file: &Path,
    format: Option<Format>,
    normalize: bool,
) -> Result<PredxTable, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Input file not found: {}", file.display()).into());
    }

    let format = format.unwrap_or_else(|| Format::detect(file));
    tracing::debug!(path = %file.display(), %format, "loading table");

    let table = match format {
        Format::Csv => {
            let data = Parser::new().parse_file(file)?;
            let config = if normalize {
                ConversionConfig::default().with_normalize(NORMALIZE_BAND)
            } else {
                ConversionConfig::default()
            };
            csv::from_data_table_with(&data, config)?
        }
        Format::Json => {
            if normalize {
                tracing::warn!("--normalize has no effect on JSON input");
            }
            codec::read_json_file(file)?
        }
        Format::Flusight => flusight::read_flusight_file(file)?,
    };
    Ok(table)
}
