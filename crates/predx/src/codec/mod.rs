//! Interchange codecs for predx tables.
//!
//! Records whose value slot holds an error are skipped on export: they have
//! no payload to write. The count of skipped records is returned in
//! [`ExportSummary`] and logged as a warning.

pub mod csv;
mod file;
pub mod json;

pub use file::{
    ExportOptions, read_csv_file, read_json_file, write_atomically, write_csv_file,
    write_json_file,
};

use serde::Serialize;

/// Outcome of exporting a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Records written.
    pub written: usize,
    /// Records skipped (failed records, or shapes the format cannot carry).
    pub skipped: usize,
}

impl ExportSummary {
    pub(crate) fn log(&self, format: &str) {
        if self.skipped > 0 {
            tracing::warn!(
                format,
                written = self.written,
                skipped = self.skipped,
                "skipped records on export"
            );
        } else {
            tracing::debug!(format, written = self.written, "exported table");
        }
    }
}
