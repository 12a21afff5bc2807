//! Verification results.

use std::fmt;

use serde::Serialize;

use crate::input::DataTable;

use super::spec::PredictionKey;

/// Message reported when nothing is missing or unexpected.
pub const COMPLETE_MESSAGE: &str = "all expected predictions present, no unexpected predictions";

/// Kind of discrepancy between a table and its expected specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Required but not present as a valid record.
    Missing,
    /// Present but not allowed by any requirement block.
    Unexpected,
}

impl DiscrepancyKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DiscrepancyKind::Missing => "missing",
            DiscrepancyKind::Unexpected => "unexpected",
        }
    }
}

/// One missing or unexpected key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub key: PredictionKey,
}

/// Outcome of checking a table against an expected specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Required keys without a valid record, in specification order.
    pub missing: Vec<PredictionKey>,
    /// Present keys outside every requirement block, in table order.
    pub unexpected: Vec<PredictionKey>,
}

impl VerificationReport {
    /// True when nothing is missing or unexpected.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// One-line summary with counts.
    pub fn summary(&self) -> String {
        if self.is_complete() {
            COMPLETE_MESSAGE.to_string()
        } else {
            format!(
                "{} missing prediction(s), {} unexpected prediction(s)",
                self.missing.len(),
                self.unexpected.len()
            )
        }
    }

    /// One entry per discrepancy, missing first. Empty when complete.
    pub fn discrepancies(&self) -> Vec<Discrepancy> {
        let missing = self.missing.iter().map(|key| Discrepancy {
            kind: DiscrepancyKind::Missing,
            key: key.clone(),
        });
        let unexpected = self.unexpected.iter().map(|key| Discrepancy {
            kind: DiscrepancyKind::Unexpected,
            key: key.clone(),
        });
        missing.chain(unexpected).collect()
    }

    /// Discrepancies as a table: a `discrepancy` column plus one column per
    /// key field seen. Fields a key lacks are `NA`.
    pub fn to_data_table(&self) -> DataTable {
        let discrepancies = self.discrepancies();

        let mut fields: Vec<&str> = Vec::new();
        for discrepancy in &discrepancies {
            for field in discrepancy.key.fields() {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }

        let mut headers = vec!["discrepancy".to_string()];
        headers.extend(fields.iter().map(|f| f.to_string()));

        let rows = discrepancies
            .iter()
            .map(|d| {
                let mut row = vec![d.kind.label().to_string()];
                row.extend(
                    fields
                        .iter()
                        .map(|f| d.key.get(f).unwrap_or("NA").to_string()),
                );
                row
            })
            .collect();

        DataTable::new(headers, rows)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for key in &self.missing {
            writeln!(f, "  missing: {}", key)?;
        }
        for key in &self.unexpected {
            writeln!(f, "  unexpected: {}", key)?;
        }
        Ok(())
    }
}
