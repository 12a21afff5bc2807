//! Reading and writing interchange files.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{PredxError, Result};
use crate::table::PredxTable;

use super::ExportSummary;

/// Options for file export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Replace an existing destination file.
    pub overwrite: bool,
}

impl ExportOptions {
    /// Options that replace an existing destination.
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }
}

/// Write through `write` into a temporary file next to `path`, then move it
/// into place. Nothing is left at `path` if writing fails.
pub fn write_atomically<F>(path: impl AsRef<Path>, options: ExportOptions, write: F) -> Result<ExportSummary>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<ExportSummary>,
{
    let path = path.as_ref();
    if !options.overwrite && path.exists() {
        return Err(PredxError::FileExists(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |source: std::io::Error| PredxError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    let summary = {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let summary = write(&mut writer)?;
        writer.flush().map_err(io_error)?;
        summary
    };

    let persisted = if options.overwrite {
        temp.persist(path)
    } else {
        temp.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            PredxError::FileExists(path.to_path_buf())
        } else {
            io_error(e.error)
        }
    })?;

    tracing::info!(
        path = %path.display(),
        written = summary.written,
        skipped = summary.skipped,
        "wrote table"
    );
    Ok(summary)
}

/// Write the table as interchange CSV.
pub fn write_csv_file(
    table: &PredxTable,
    path: impl AsRef<Path>,
    options: ExportOptions,
) -> Result<ExportSummary> {
    write_atomically(path, options, |writer| super::csv::write_csv(table, writer))
}

/// Write the table as interchange JSON.
pub fn write_json_file(
    table: &PredxTable,
    path: impl AsRef<Path>,
    options: ExportOptions,
) -> Result<ExportSummary> {
    write_atomically(path, options, |writer| super::json::write_json(table, writer))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| PredxError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Read an interchange CSV file.
pub fn read_csv_file(path: impl AsRef<Path>) -> Result<PredxTable> {
    super::csv::read_csv(open(path.as_ref())?)
}

/// Read an interchange JSON file.
pub fn read_json_file(path: impl AsRef<Path>) -> Result<PredxTable> {
    super::json::read_json(open(path.as_ref())?)
}
