//! predx: typed probabilistic forecast tables.
//!
//! Forecast submissions arrive as long tables of target/location rows.
//! predx turns them into validated prediction values (point estimates,
//! binary probabilities, categorical and lower-bound bins, samples), writes
//! them back out as CSV or JSON, and checks a submission against the full
//! set of predictions it is expected to contain.
//!
//! # Core Principles
//!
//! - **Valid by construction**: a [`Predx`] value has passed its checks
//! - **Per-record failure**: a bad row becomes a failed record, not a failed batch
//! - **Non-destructive**: input tables are never modified
//!
//! # Example
//!
//! ```no_run
//! use predx::{Converter, ExpectedSpec, Parser, verify_expected};
//!
//! let data = Parser::new().parse_file("submission.csv").unwrap();
//! let table = Converter::new().convert(&data).unwrap();
//! println!("{} records, {} failed", table.len(), table.error_count());
//!
//! let spec = ExpectedSpec::from_file("expected.json").unwrap();
//! println!("{}", verify_expected(&table, &spec));
//! ```

pub mod codec;
pub mod convert;
pub mod error;
pub mod flusight;
pub mod input;
pub mod table;
pub mod value;
pub mod verify;

pub use codec::{ExportOptions, ExportSummary};
pub use convert::{ConversionConfig, Converter};
pub use error::{PredxError, Result};
pub use input::{DataTable, Parser, ParserConfig};
pub use table::{PredxRecord, PredxTable, RowKey};
pub use value::{
    BinCat, BinLwr, Binary, Point, Predx, PredxClass, RecordError, Sample, ValidationError,
};
pub use verify::{
    Discrepancy, DiscrepancyKind, ExpectedSpec, PredictionKey, RequirementBlock,
    VerificationReport, verify_expected,
};
