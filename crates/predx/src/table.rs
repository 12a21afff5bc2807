//! The predx table: ordered records of typed (or failed) predictions.

use indexmap::IndexMap;

use crate::value::{Predx, RecordError};

/// Descriptive fields identifying which prediction a record belongs to,
/// in column order (e.g. `target`, `location`).
pub type RowKey = IndexMap<String, String>;

/// One prediction: its key, its variant tag and the value or why it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PredxRecord {
    /// Descriptive key fields.
    pub key: RowKey,
    /// Variant tag as read from the input. Matches `value`'s class when valid.
    pub predx_class: String,
    /// The constructed value, or the error that prevented construction.
    pub value: Result<Predx, RecordError>,
}

impl PredxRecord {
    /// Record holding a valid value.
    pub fn new(key: RowKey, value: Predx) -> Self {
        Self {
            key,
            predx_class: value.class().name().to_string(),
            value: Ok(value),
        }
    }

    /// Record holding a failure.
    pub fn failed(key: RowKey, predx_class: impl Into<String>, error: RecordError) -> Self {
        Self {
            key,
            predx_class: predx_class.into(),
            value: Err(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_ok()
    }

    /// The value, if construction succeeded.
    pub fn predx(&self) -> Option<&Predx> {
        self.value.as_ref().ok()
    }

    /// The failure, if construction failed.
    pub fn error(&self) -> Option<&RecordError> {
        self.value.as_ref().err()
    }

    /// Value of one key field.
    pub fn key_value(&self, field: &str) -> Option<&str> {
        self.key.get(field).map(|s| s.as_str())
    }
}

/// Ordered collection of prediction records.
///
/// Tables are not edited in place; [`filter`](Self::filter) and the codecs
/// produce new tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredxTable {
    records: Vec<PredxRecord>,
}

impl PredxTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<PredxRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PredxRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PredxRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredxRecord> {
        self.records.iter()
    }

    /// Records holding a valid value, paired with that value.
    pub fn valid(&self) -> impl Iterator<Item = (&PredxRecord, &Predx)> {
        self.records
            .iter()
            .filter_map(|r| r.predx().map(|value| (r, value)))
    }

    /// Records holding a failure, paired with that failure.
    pub fn errors(&self) -> impl Iterator<Item = (&PredxRecord, &RecordError)> {
        self.records
            .iter()
            .filter_map(|r| r.error().map(|error| (r, error)))
    }

    pub fn valid_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_valid()).count()
    }

    pub fn error_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// New table keeping the records matching `predicate`, in order.
    pub fn filter(&self, mut predicate: impl FnMut(&PredxRecord) -> bool) -> PredxTable {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Union of key field names across records, in first-seen order.
    pub fn key_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in &self.records {
            for field in record.key.keys() {
                if !columns.contains(&field.as_str()) {
                    columns.push(field.as_str());
                }
            }
        }
        columns
    }
}

impl FromIterator<PredxRecord> for PredxTable {
    fn from_iter<I: IntoIterator<Item = PredxRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PredxTable {
    type Item = &'a PredxRecord;
    type IntoIter = std::slice::Iter<'a, PredxRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for PredxTable {
    type Item = PredxRecord;
    type IntoIter = std::vec::IntoIter<PredxRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
