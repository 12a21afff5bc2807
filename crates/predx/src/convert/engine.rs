//! Conversion engine turning raw rows into typed prediction records.
//!
//! Each row declares a variant tag. Point and Binary rows become one record
//! each. BinCat, BinLwr and Sample rows sharing a grouping key and tag are
//! aggregated into one record placed where the group first appears. A row
//! that fails to convert yields a failed record; only configuration and
//! grouping ambiguities abort the call.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{PredxError, Result};
use crate::input::{DataTable, is_missing};
use crate::table::{PredxRecord, PredxTable, RowKey};
use crate::value::{
    BinCat, BinLwr, Binary, NORMALIZE_BAND, Point, Predx, PredxClass, RecordError, Sample,
    ValidationError, normalize_probs,
};

/// Columns carrying prediction payloads, in interchange order.
pub const VALUE_COLUMNS: &[&str] = &["point", "prob", "cat", "lwr", "sample"];

/// Conversion configuration.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Columns forming each record's key.
    pub key_columns: Vec<String>,
    /// Column holding the variant tag.
    pub class_column: String,
    /// Tag used when the class column is absent or a cell is missing.
    pub default_class: Option<PredxClass>,
    /// Key columns used to aggregate multi-row variants (None = all key columns).
    pub group_by: Option<Vec<String>>,
    /// Rescale bin probabilities before construction.
    pub normalize: bool,
    /// Band around 1.0 accepted by the rescaling step.
    pub normalize_band: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            key_columns: vec!["target".to_string(), "location".to_string()],
            class_column: "predx_class".to_string(),
            default_class: None,
            group_by: None,
            normalize: false,
            normalize_band: NORMALIZE_BAND,
        }
    }
}

impl ConversionConfig {
    /// Set the key columns.
    pub fn with_key_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the tag applied when no class is given.
    pub fn with_default_class(mut self, class: PredxClass) -> Self {
        self.default_class = Some(class);
        self
    }

    /// Aggregate multi-row variants on a subset of the key columns.
    pub fn with_group_by<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.group_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Rescale bin probabilities whose sum lies within `band` of one.
    pub fn with_normalize(mut self, band: f64) -> Self {
        self.normalize = true;
        self.normalize_band = band;
        self
    }
}

/// Builds predx tables from raw data tables.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
}

/// Where an output record comes from.
enum Slot {
    /// One row, or a row whose tag could not be read.
    Row {
        row: usize,
        tag: String,
        class: std::result::Result<PredxClass, RecordError>,
    },
    /// Rows aggregated into one multi-row value.
    Group { class: PredxClass, rows: Vec<usize> },
}

/// Column positions resolved against one input table.
struct Layout {
    key: Vec<(String, usize)>,
    group: Vec<usize>,
    shared: Vec<(String, usize)>,
    class: Option<usize>,
    values: HashMap<&'static str, usize>,
}

impl Converter {
    /// Create a converter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with custom configuration.
    pub fn with_config(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert rows using the tag in each row's class column.
    pub fn convert(&self, table: &DataTable) -> Result<PredxTable> {
        self.convert_with(table, None)
    }

    /// Convert every row as `class`, ignoring any class column.
    pub fn convert_as(&self, table: &DataTable, class: PredxClass) -> Result<PredxTable> {
        self.convert_with(table, Some(class))
    }

    fn convert_with(&self, table: &DataTable, forced: Option<PredxClass>) -> Result<PredxTable> {
        let layout = self.resolve_layout(table, forced.is_some())?;

        let mut slots: Vec<Slot> = Vec::new();
        let mut groups: IndexMap<(PredxClass, Vec<&str>), usize> = IndexMap::new();

        for (row_idx, row) in table.rows.iter().enumerate() {
            let (tag, class) = match forced {
                Some(class) => (class.name().to_string(), Ok(class)),
                None => self.read_class(&layout, row),
            };

            match class {
                Ok(class) if class.is_multi_row() => {
                    let group_key = (class, layout.group_values(row));
                    match groups.get(&group_key) {
                        Some(&slot_idx) => {
                            if let Slot::Group { rows, .. } = &mut slots[slot_idx] {
                                layout.check_shared(&table.rows[rows[0]], row)?;
                                rows.push(row_idx);
                            }
                        }
                        None => {
                            groups.insert(group_key, slots.len());
                            slots.push(Slot::Group {
                                class,
                                rows: vec![row_idx],
                            });
                        }
                    }
                }
                class => slots.push(Slot::Row {
                    row: row_idx,
                    tag,
                    class,
                }),
            }
        }

        let records: Vec<PredxRecord> = slots
            .into_iter()
            .map(|slot| self.build_record(table, &layout, slot))
            .collect();

        let converted = PredxTable::from_records(records);
        for (record, error) in converted.errors() {
            tracing::debug!(
                class = %record.predx_class,
                key = ?record.key,
                %error,
                "record failed conversion"
            );
        }
        tracing::info!(
            rows = table.row_count(),
            records = converted.len(),
            errors = converted.error_count(),
            "converted table"
        );

        Ok(converted)
    }

    fn resolve_layout(&self, table: &DataTable, class_forced: bool) -> Result<Layout> {
        let key = self
            .config
            .key_columns
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .map(|idx| (name.clone(), idx))
                    .ok_or_else(|| PredxError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let class = table.column_index(&self.config.class_column);
        if class.is_none() && !class_forced && self.config.default_class.is_none() {
            return Err(PredxError::MissingColumn(self.config.class_column.clone()));
        }

        let (group, shared) = match &self.config.group_by {
            Some(group_by) => {
                if let Some(stray) = group_by.iter().find(|g| !self.config.key_columns.contains(g)) {
                    return Err(PredxError::Config(format!(
                        "group_by column '{}' is not a key column",
                        stray
                    )));
                }
                let group = key
                    .iter()
                    .filter(|(name, _)| group_by.contains(name))
                    .map(|(_, idx)| *idx)
                    .collect();
                let shared = key
                    .iter()
                    .filter(|(name, _)| !group_by.contains(name))
                    .cloned()
                    .collect();
                (group, shared)
            }
            None => (key.iter().map(|(_, idx)| *idx).collect(), Vec::new()),
        };

        let values = VALUE_COLUMNS
            .iter()
            .filter_map(|&name| table.column_index(name).map(|idx| (name, idx)))
            .collect();

        Ok(Layout {
            key,
            group,
            shared,
            class,
            values,
        })
    }

    fn read_class(
        &self,
        layout: &Layout,
        row: &[String],
    ) -> (String, std::result::Result<PredxClass, RecordError>) {
        match layout.class.map(|idx| cell(row, idx)) {
            Some(raw) if !is_missing(raw) => (raw.trim().to_string(), raw.parse()),
            raw => match self.config.default_class {
                Some(class) => (class.name().to_string(), Ok(class)),
                None => (
                    raw.unwrap_or("NA").trim().to_string(),
                    Err(RecordError::Format(format!(
                        "missing {}",
                        self.config.class_column
                    ))),
                ),
            },
        }
    }

    fn build_record(&self, table: &DataTable, layout: &Layout, slot: Slot) -> PredxRecord {
        match slot {
            Slot::Row { row, tag, class } => {
                let fields = &table.rows[row];
                let key = layout.key_of(fields);
                match class.and_then(|class| self.build_value(layout, class, &[fields])) {
                    Ok(value) => PredxRecord::new(key, value),
                    Err(error) => PredxRecord::failed(key, tag, error),
                }
            }
            Slot::Group { class, rows } => {
                let fields: Vec<&Vec<String>> = rows.iter().map(|&r| &table.rows[r]).collect();
                let key = layout.key_of(fields[0]);
                match self.build_value(layout, class, &fields) {
                    Ok(value) => PredxRecord::new(key, value),
                    Err(error) => PredxRecord::failed(key, class.name(), error),
                }
            }
        }
    }

    fn build_value(
        &self,
        layout: &Layout,
        class: PredxClass,
        rows: &[&Vec<String>],
    ) -> std::result::Result<Predx, RecordError> {
        let value: Predx = match class {
            PredxClass::Point => Point::new(layout.number(rows[0], class, "point")?)?.into(),
            PredxClass::Binary => Binary::new(layout.number(rows[0], class, "prob")?)?.into(),
            PredxClass::BinCat => {
                let cats = rows
                    .iter()
                    .map(|row| layout.text(row, class, "cat"))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let probs = layout.numbers(rows, class, "prob")?;
                let probs = self.prepare_probs(probs, cats.iter().any(|c| is_missing(c)))?;
                BinCat::new(cats.into_iter().zip(probs).collect())?.into()
            }
            PredxClass::BinLwr => {
                let lwrs = layout.numbers(rows, class, "lwr")?;
                let probs = layout.numbers(rows, class, "prob")?;
                let probs = self.prepare_probs(probs, lwrs.iter().any(|l| l.is_nan()))?;
                BinLwr::new(lwrs.into_iter().zip(probs).collect())?.into()
            }
            PredxClass::Sample => Sample::new(layout.numbers(rows, class, "sample")?)?.into(),
        };
        Ok(value)
    }

    /// Apply optional rescaling; missing bin keys still fail as missing.
    fn prepare_probs(
        &self,
        probs: Vec<f64>,
        keys_missing: bool,
    ) -> std::result::Result<Vec<f64>, ValidationError> {
        if !self.config.normalize {
            return Ok(probs);
        }
        if keys_missing {
            return Err(ValidationError::Missing);
        }
        normalize_probs(&probs, self.config.normalize_band)
    }
}

impl Layout {
    /// Key fields of a row. Empty cells mean the record has no such field.
    fn key_of(&self, row: &[String]) -> RowKey {
        self.key
            .iter()
            .map(|(name, idx)| (name, cell(row, *idx).trim()))
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }

    fn group_values<'a>(&self, row: &'a [String]) -> Vec<&'a str> {
        self.group.iter().map(|&idx| cell(row, idx).trim()).collect()
    }

    fn check_shared(&self, first: &[String], row: &[String]) -> Result<()> {
        for (name, idx) in &self.shared {
            let (a, b) = (cell(first, *idx).trim(), cell(row, *idx).trim());
            if a != b {
                return Err(PredxError::Grouping {
                    column: name.clone(),
                    first: a.to_string(),
                    second: b.to_string(),
                });
            }
        }
        Ok(())
    }

    fn value_index(
        &self,
        class: PredxClass,
        column: &str,
    ) -> std::result::Result<usize, RecordError> {
        self.values.get(column).copied().ok_or_else(|| {
            RecordError::Format(format!("{} requires column '{}'", class, column))
        })
    }

    fn text(
        &self,
        row: &[String],
        class: PredxClass,
        column: &str,
    ) -> std::result::Result<String, RecordError> {
        let idx = self.value_index(class, column)?;
        Ok(cell(row, idx).trim().to_string())
    }

    fn number(
        &self,
        row: &[String],
        class: PredxClass,
        column: &str,
    ) -> std::result::Result<f64, RecordError> {
        let idx = self.value_index(class, column)?;
        parse_number(cell(row, idx), column)
    }

    fn numbers(
        &self,
        rows: &[&Vec<String>],
        class: PredxClass,
        column: &str,
    ) -> std::result::Result<Vec<f64>, RecordError> {
        rows.iter()
            .map(|row| self.number(row, class, column))
            .collect()
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Parse a numeric cell. Missing markers become NaN so that construction
/// reports them as missing.
fn parse_number(raw: &str, column: &str) -> std::result::Result<f64, RecordError> {
    if is_missing(raw) {
        return Ok(f64::NAN);
    }
    raw.trim().parse::<f64>().map_err(|_| {
        RecordError::Format(format!(
            "cannot parse '{}' in column '{}' as a number",
            raw.trim(),
            column
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interchange(rows: &[&[&str]]) -> DataTable {
        DataTable::from_strs(
            &["target", "location", "predx_class", "point", "prob", "cat", "lwr", "sample"],
            rows,
        )
    }

    #[test]
    fn test_one_record_per_scalar_row() {
        let table = interchange(&[
            &["peak", "US", "Point", "4.2", "NA", "NA", "NA", "NA"],
            &["peak", "US", "Point", "5.0", "NA", "NA", "NA", "NA"],
            &["onset", "US", "Binary", "NA", "0.3", "NA", "NA", "NA"],
        ]);
        let converted = Converter::new().convert(&table).unwrap();

        assert_eq!(converted.len(), 3);
        assert_eq!(converted.valid_count(), 3);
        assert_eq!(converted.records()[2].predx_class, "Binary");
    }

    #[test]
    fn test_row_failure_does_not_abort_batch() {
        let table = interchange(&[
            &["peak", "US", "Point", "NA", "NA", "NA", "NA", "NA"],
            &["onset", "US", "Binary", "NA", "1.5", "NA", "NA", "NA"],
            &["onset", "HHS Region 1", "Binary", "NA", "0.5", "NA", "NA", "NA"],
        ]);
        let converted = Converter::new().convert(&table).unwrap();

        assert_eq!(converted.len(), 3);
        assert_eq!(
            converted.records()[0].error(),
            Some(&RecordError::Validation(ValidationError::Missing))
        );
        assert!(matches!(
            converted.records()[1].error(),
            Some(RecordError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(converted.records()[2].is_valid());
    }

    #[test]
    fn test_bins_aggregate_at_first_appearance() {
        let table = interchange(&[
            &["wk", "US", "BinLwr", "NA", "0.5", "NA", "0.3", "NA"],
            &["peak", "US", "Point", "4", "NA", "NA", "NA", "NA"],
            &["wk", "US", "BinLwr", "NA", "0.2", "NA", "0.1", "NA"],
            &["wk", "US", "BinLwr", "NA", "0.3", "NA", "0.2", "NA"],
        ]);
        let converted = Converter::new().convert(&table).unwrap();

        assert_eq!(converted.len(), 2);
        let first = &converted.records()[0];
        assert_eq!(first.key_value("target"), Some("wk"));
        match first.predx() {
            Some(Predx::BinLwr(value)) => {
                assert_eq!(value.bins(), &[(0.1, 0.2), (0.2, 0.3), (0.3, 0.5)]);
            }
            other => panic!("expected BinLwr, got {:?}", other),
        }
        assert_eq!(converted.records()[1].predx_class, "Point");
    }

    #[test]
    fn test_bincat_and_sample_groups() {
        let table = interchange(&[
            &["onset", "US", "BinCat", "NA", "0.6", "40", "NA", "NA"],
            &["onset", "US", "BinCat", "NA", "0.4", "none", "NA", "NA"],
            &["peak", "US", "Sample", "NA", "NA", "NA", "NA", "3.1"],
            &["peak", "US", "Sample", "NA", "NA", "NA", "NA", "2.9"],
        ]);
        let converted = Converter::new().convert(&table).unwrap();

        assert_eq!(converted.len(), 2);
        match converted.records()[0].predx() {
            Some(Predx::BinCat(value)) => {
                assert_eq!(value.categories().collect::<Vec<_>>(), vec!["40", "none"]);
            }
            other => panic!("expected BinCat, got {:?}", other),
        }
        match converted.records()[1].predx() {
            Some(Predx::Sample(value)) => assert_eq!(value.draws(), &[3.1, 2.9]),
            other => panic!("expected Sample, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_class_is_format_error() {
        let table = interchange(&[&["peak", "US", "Quantile", "4", "NA", "NA", "NA", "NA"]]);
        let converted = Converter::new().convert(&table).unwrap();

        let record = &converted.records()[0];
        assert_eq!(record.predx_class, "Quantile");
        assert!(matches!(record.error(), Some(RecordError::Format(_))));
    }

    #[test]
    fn test_unparsable_number_is_format_error() {
        let table = interchange(&[&["peak", "US", "Point", "four", "NA", "NA", "NA", "NA"]]);
        let converted = Converter::new().convert(&table).unwrap();
        let error = converted.records()[0].error().unwrap();
        assert_eq!(
            error.to_string(),
            "format error: cannot parse 'four' in column 'point' as a number"
        );
    }

    #[test]
    fn test_missing_value_column_is_format_error() {
        let table = DataTable::from_strs(
            &["target", "location", "predx_class", "point"],
            &[&["onset", "US", "Binary", "NA"]],
        );
        let converted = Converter::new().convert(&table).unwrap();
        assert_eq!(
            converted.records()[0].error(),
            Some(&RecordError::Format(
                "Binary requires column 'prob'".to_string()
            ))
        );
    }

    #[test]
    fn test_missing_key_column_is_fatal() {
        let table = DataTable::from_strs(&["target", "predx_class", "point"], &[&["peak", "Point", "1"]]);
        let err = Converter::new().convert(&table).unwrap_err();
        assert!(matches!(err, PredxError::MissingColumn(ref c) if c == "location"));
    }

    #[test]
    fn test_default_class_applies_to_all_rows() {
        let table = DataTable::from_strs(
            &["target", "location", "prob"],
            &[&["habitability", "Mercury", "0.01"], &["habitability", "Earth", "0.99"]],
        );
        let config = ConversionConfig::default().with_default_class(PredxClass::Binary);
        let converted = Converter::with_config(config).convert(&table).unwrap();

        assert_eq!(converted.valid_count(), 2);
        assert!(converted.iter().all(|r| r.predx_class == "Binary"));
    }

    #[test]
    fn test_missing_class_without_default_is_fatal() {
        let table = DataTable::from_strs(&["target", "location", "prob"], &[&["t", "l", "0.5"]]);
        let err = Converter::new().convert(&table).unwrap_err();
        assert!(matches!(err, PredxError::MissingColumn(ref c) if c == "predx_class"));
    }

    #[test]
    fn test_convert_as_overrides_class_column() {
        let table = interchange(&[&["peak", "US", "Binary", "7", "NA", "NA", "NA", "NA"]]);
        let converted = Converter::new().convert_as(&table, PredxClass::Point).unwrap();
        assert_eq!(converted.records()[0].predx_class, "Point");
        assert!(converted.records()[0].is_valid());
    }

    #[test]
    fn test_group_by_subset_conflict_is_fatal() {
        let table = DataTable::from_strs(
            &["target", "location", "unit", "predx_class", "cat", "prob"],
            &[
                &["onset", "US", "week", "BinCat", "40", "0.5"],
                &["onset", "US", "percent", "BinCat", "41", "0.5"],
            ],
        );
        let config = ConversionConfig::default()
            .with_key_columns(["target", "location", "unit"])
            .with_group_by(["target", "location"]);
        let err = Converter::with_config(config).convert(&table).unwrap_err();

        match err {
            PredxError::Grouping {
                column,
                first,
                second,
            } => {
                assert_eq!(column, "unit");
                assert_eq!(first, "week");
                assert_eq!(second, "percent");
            }
            other => panic!("expected grouping error, got {:?}", other),
        }
    }

    #[test]
    fn test_group_by_subset_consistent() {
        let table = DataTable::from_strs(
            &["target", "location", "unit", "predx_class", "cat", "prob"],
            &[
                &["onset", "US", "week", "BinCat", "40", "0.5"],
                &["onset", "US", "week", "BinCat", "41", "0.5"],
            ],
        );
        let config = ConversionConfig::default()
            .with_key_columns(["target", "location", "unit"])
            .with_group_by(["target", "location"]);
        let converted = Converter::with_config(config).convert(&table).unwrap();
        assert_eq!(converted.len(), 1);
        assert_eq!(converted.records()[0].key_value("unit"), Some("week"));
    }

    #[test]
    fn test_group_by_outside_key_is_config_error() {
        let table = interchange(&[]);
        let config = ConversionConfig::default().with_group_by(["unit"]);
        let err = Converter::with_config(config).convert(&table).unwrap_err();
        assert!(matches!(err, PredxError::Config(_)));
    }

    #[test]
    fn test_normalize_rescales_bins() {
        let table = interchange(&[
            &["peak", "US", "BinLwr", "NA", "0.5", "NA", "0", "NA"],
            &["peak", "US", "BinLwr", "NA", "0.45", "NA", "1", "NA"],
        ]);

        let strict = Converter::new().convert(&table).unwrap();
        assert!(matches!(
            strict.records()[0].error(),
            Some(RecordError::Validation(ValidationError::ProbabilitySum { .. }))
        ));

        let config = ConversionConfig::default().with_normalize(NORMALIZE_BAND);
        let normalized = Converter::with_config(config).convert(&table).unwrap();
        match normalized.records()[0].predx() {
            Some(Predx::BinLwr(value)) => {
                let sum: f64 = value.bins().iter().map(|(_, p)| p).sum();
                assert!((sum - 1.0).abs() < 1e-9);
            }
            other => panic!("expected BinLwr, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_still_reports_missing_bin_key() {
        let table = interchange(&[
            &["onset", "US", "BinCat", "NA", "0.5", "NA", "NA", "NA"],
            &["onset", "US", "BinCat", "NA", "0.5", "41", "NA", "NA"],
        ]);
        let config = ConversionConfig::default().with_normalize(NORMALIZE_BAND);
        let converted = Converter::with_config(config).convert(&table).unwrap();
        assert_eq!(
            converted.records()[0].error(),
            Some(&RecordError::Validation(ValidationError::Missing))
        );
    }

    #[test]
    fn test_input_untouched() {
        let table = interchange(&[&["peak", "US", "Point", "4", "NA", "NA", "NA", "NA"]]);
        let before = table.clone();
        let _ = Converter::new().convert(&table).unwrap();
        assert_eq!(table, before);
    }
}
