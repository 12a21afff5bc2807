//! Conversion of raw rows into a predx table.

mod engine;

pub use engine::{ConversionConfig, Converter, VALUE_COLUMNS};
