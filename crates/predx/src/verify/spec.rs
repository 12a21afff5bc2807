//! Expected specifications: requirement blocks and the keys they denote.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PredxError, Result};
use crate::value::format_number;

/// Field holding a BinCat bin's category.
pub const CAT_FIELD: &str = "cat";
/// Field holding a BinLwr bin's lower bound.
pub const LWR_FIELD: &str = "lwr";
/// Field holding the variant tag.
pub const CLASS_FIELD: &str = "predx_class";

/// Whether `field` addresses a bin inside a value rather than the record.
pub fn is_bin_field(field: &str) -> bool {
    field == CAT_FIELD || field == LWR_FIELD
}

/// Canonical text of a field value; lower bounds compare numerically.
pub fn canonical_value(field: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    if field == LWR_FIELD {
        if let Ok(number) = trimmed.parse::<f64>() {
            return format_number(number);
        }
    }
    trimmed.to_string()
}

/// A concrete prediction key: field name → canonical value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PredictionKey(BTreeMap<String, String>);

impl PredictionKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, canonicalizing its value.
    pub fn with(mut self, field: impl Into<String>, value: &str) -> Self {
        let field = field.into();
        let value = canonical_value(&field, value);
        self.0.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|s| s.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Restrict to `fields`, or `None` if this key lacks one of them.
    pub fn project<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Option<PredictionKey> {
        fields
            .into_iter()
            .map(|field| {
                self.0
                    .get(field)
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect::<Option<BTreeMap<_, _>>>()
            .map(PredictionKey)
    }
}

impl fmt::Display for PredictionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// One requirement: every combination of the allowed field values must be
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<String, Value>", into = "IndexMap<String, Vec<String>>")]
pub struct RequirementBlock {
    fields: IndexMap<String, IndexSet<String>>,
}

impl RequirementBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `name` to `values`. Duplicates collapse.
    pub fn field<S: AsRef<str>>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        let name = name.into();
        let values = values
            .into_iter()
            .map(|v| canonical_value(&name, v.as_ref()))
            .collect();
        self.fields.insert(name, values);
        self
    }

    /// Constrained field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Allowed values of `name`, if the block constrains it.
    pub fn values(&self, name: &str) -> Option<&IndexSet<String>> {
        self.fields.get(name)
    }

    /// Whether `value` is allowed for `name`.
    pub fn allows(&self, name: &str, value: &str) -> bool {
        self.fields
            .get(name)
            .is_some_and(|values| values.contains(value))
    }

    /// Number of keys the block denotes, saturating at `usize::MAX`.
    pub fn cardinality(&self) -> usize {
        if self.denotes_nothing() {
            return 0;
        }
        self.fields
            .values()
            .fold(1usize, |total, values| total.saturating_mul(values.len()))
    }

    fn denotes_nothing(&self) -> bool {
        self.fields.is_empty() || self.fields.values().any(IndexSet::is_empty)
    }

    /// Lazily enumerate every key in the cross product.
    pub fn keys(&self) -> BlockKeys<'_> {
        BlockKeys {
            block: self,
            indices: vec![0; self.fields.len()],
            done: self.denotes_nothing(),
        }
    }

    /// Whether a record-level key satisfies every non-bin constraint.
    pub fn matches_record(&self, key: &PredictionKey) -> bool {
        self.fields
            .iter()
            .filter(|(name, _)| !is_bin_field(name))
            .all(|(name, values)| key.get(name).is_some_and(|v| values.contains(v)))
    }
}

impl TryFrom<IndexMap<String, Value>> for RequirementBlock {
    type Error = String;

    fn try_from(raw: IndexMap<String, Value>) -> std::result::Result<Self, Self::Error> {
        let mut block = RequirementBlock::new();
        for (name, value) in raw {
            let items = match value {
                Value::Array(items) => items,
                scalar => vec![scalar],
            };
            let values = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    other => Err(format!("field '{}' has unsupported value {}", name, other)),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            block = block.field(name, values);
        }
        Ok(block)
    }
}

impl From<RequirementBlock> for IndexMap<String, Vec<String>> {
    fn from(block: RequirementBlock) -> Self {
        block
            .fields
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect()
    }
}

/// Iterator over a block's cross product, odometer style.
pub struct BlockKeys<'a> {
    block: &'a RequirementBlock,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for BlockKeys<'_> {
    type Item = PredictionKey;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let key = PredictionKey(
            self.block
                .fields
                .iter()
                .zip(&self.indices)
                .filter_map(|((name, values), &idx)| {
                    values.get_index(idx).map(|v| (name.clone(), v.clone()))
                })
                .collect(),
        );

        // Advance the last field fastest
        self.done = true;
        for (slot, values) in self.indices.iter_mut().zip(self.block.fields.values()).rev() {
            *slot += 1;
            if *slot < values.len() {
                self.done = false;
                break;
            }
            *slot = 0;
        }

        Some(key)
    }
}

/// A full expected specification: the union of its blocks' keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedSpec {
    blocks: Vec<RequirementBlock>,
}

impl ExpectedSpec {
    pub fn new(blocks: Vec<RequirementBlock>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[RequirementBlock] {
        &self.blocks
    }

    /// Parse from a JSON array of blocks.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PredxError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Every expected key, deduplicated, in block order.
    pub fn expected_keys(&self) -> IndexSet<PredictionKey> {
        self.blocks.iter().flat_map(|block| block.keys()).collect()
    }
}
