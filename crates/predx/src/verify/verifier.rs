//! Diffing a table against an expected specification.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::table::{PredxRecord, PredxTable};
use crate::value::{Predx, format_number};

use super::report::VerificationReport;
use super::spec::{
    CAT_FIELD, CLASS_FIELD, ExpectedSpec, LWR_FIELD, PredictionKey, RequirementBlock, is_bin_field,
};

/// What one valid record contributes to the present set.
struct PresentKey {
    base: PredictionKey,
    bins: Option<(&'static str, Vec<String>)>,
}

impl PresentKey {
    fn from_record(record: &PredxRecord, value: &Predx) -> Self {
        let base = record
            .key
            .iter()
            .fold(PredictionKey::new(), |key, (field, v)| key.with(field.as_str(), v))
            .with(CLASS_FIELD, &record.predx_class);

        let bins = match value {
            Predx::BinCat(bins) => Some((
                CAT_FIELD,
                bins.categories().map(|c| c.to_string()).collect(),
            )),
            Predx::BinLwr(bins) => Some((LWR_FIELD, bins.lower_bounds().map(format_number).collect())),
            Predx::Point(_) | Predx::Binary(_) | Predx::Sample(_) => None,
        };

        Self { base, bins }
    }

    /// Bin keys for `field`; empty when the value has no bins of that kind.
    fn bin_keys<'a>(&'a self, field: &'a str) -> impl Iterator<Item = PredictionKey> + 'a {
        self.bins
            .iter()
            .filter(move |(bin_field, _)| *bin_field == field)
            .flat_map(move |(_, values)| values.iter().map(move |v| self.base.clone().with(field, v)))
    }
}

/// Find required keys without a valid record, and valid records no
/// requirement block allows.
///
/// Failed records contribute nothing, so their keys count as missing.
pub fn verify_expected(table: &PredxTable, spec: &ExpectedSpec) -> VerificationReport {
    let present: Vec<PresentKey> = table
        .valid()
        .map(|(record, value)| PresentKey::from_record(record, value))
        .collect();

    let mut missing = IndexSet::new();
    for block in spec.blocks() {
        let found = present_in_block(&present, block);
        for key in block.keys() {
            if !found.contains(&key) {
                missing.insert(key);
            }
        }
    }

    let mut unexpected = IndexSet::new();
    for entry in &present {
        let matching: Vec<&RequirementBlock> = spec
            .blocks()
            .iter()
            .filter(|block| block.matches_record(&entry.base))
            .collect();
        if matching.is_empty() {
            unexpected.insert(entry.base.clone());
            continue;
        }

        let Some((field, values)) = &entry.bins else {
            continue;
        };
        let constraining: Vec<&RequirementBlock> = matching
            .into_iter()
            .filter(|block| block.values(field).is_some())
            .collect();
        if constraining.is_empty() {
            continue;
        }
        for value in values {
            if !constraining.iter().any(|block| block.allows(field, value)) {
                unexpected.insert(entry.base.clone().with(*field, value));
            }
        }
    }

    let report = VerificationReport {
        missing: missing.into_iter().collect(),
        unexpected: unexpected.into_iter().collect(),
    };
    tracing::info!(
        records = table.len(),
        blocks = spec.blocks().len(),
        missing = report.missing.len(),
        unexpected = report.unexpected.len(),
        "verified table against expected specification"
    );
    report
}

/// Present keys projected onto the block's fields.
fn present_in_block(present: &[PresentKey], block: &RequirementBlock) -> HashSet<PredictionKey> {
    let fields: Vec<&str> = block.field_names().collect();
    let bin_field = fields.iter().copied().find(|field| is_bin_field(field));

    match bin_field {
        Some(bin_field) => present
            .iter()
            .flat_map(|entry| entry.bin_keys(bin_field))
            .filter_map(|key| key.project(fields.iter().copied()))
            .collect(),
        None => present
            .iter()
            .filter_map(|entry| entry.base.project(fields.iter().copied()))
            .collect(),
    }
}
