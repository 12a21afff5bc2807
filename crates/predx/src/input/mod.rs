//! Raw tabular input.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, is_missing};
