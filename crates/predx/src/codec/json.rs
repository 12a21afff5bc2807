//! Nested JSON interchange form.
//!
//! A document is an array of objects. Key fields sit at the top level next
//! to `predx_class`; the payload nests under `predx`, with bins as parallel
//! arrays:
//!
//! ```json
//! [{"target": "1 wk ahead", "location": "US National", "predx_class": "BinLwr",
//!   "predx": {"lwr": [0.0, 0.1], "prob": [0.4, 0.6]}}]
//! ```

use std::io::{Read, Write};

use serde::de::Error as _;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::input::is_missing;
use crate::table::{PredxRecord, PredxTable, RowKey};
use crate::value::{BinCat, BinLwr, Binary, Point, Predx, PredxClass, RecordError, Sample};

use super::ExportSummary;

const CLASS_FIELD: &str = "predx_class";
const PAYLOAD_FIELD: &str = "predx";

/// Build the JSON document for a table.
pub fn to_json_value(table: &PredxTable) -> (Value, ExportSummary) {
    let mut summary = ExportSummary::default();
    let mut objects = Vec::new();

    for record in table {
        let Some(value) = record.predx() else {
            summary.skipped += 1;
            continue;
        };
        summary.written += 1;

        let mut object: Map<String, Value> = record
            .key
            .iter()
            .map(|(field, v)| (field.clone(), Value::String(v.clone())))
            .collect();
        object.insert(CLASS_FIELD.to_string(), Value::String(record.predx_class.clone()));
        object.insert(PAYLOAD_FIELD.to_string(), payload(value));
        objects.push(Value::Object(object));
    }

    (Value::Array(objects), summary)
}

fn payload(value: &Predx) -> Value {
    match value {
        Predx::Point(point) => json!({ "point": point.value() }),
        Predx::Binary(binary) => json!({ "prob": binary.prob() }),
        Predx::BinCat(bins) => {
            let (cats, probs): (Vec<&str>, Vec<f64>) =
                bins.bins().iter().map(|(c, p)| (c.as_str(), *p)).unzip();
            json!({ "cat": cats, "prob": probs })
        }
        Predx::BinLwr(bins) => {
            let (lwrs, probs): (Vec<f64>, Vec<f64>) = bins.bins().iter().copied().unzip();
            json!({ "lwr": lwrs, "prob": probs })
        }
        Predx::Sample(sample) => json!({ "sample": sample.draws() }),
    }
}

/// Write the table as pretty-printed JSON.
pub fn write_json<W: Write>(table: &PredxTable, writer: W) -> Result<ExportSummary> {
    let (value, summary) = to_json_value(table);
    serde_json::to_writer_pretty(writer, &value)?;
    summary.log("json");
    Ok(summary)
}

/// Render the table as a JSON string.
pub fn to_json_string(table: &PredxTable) -> Result<(String, ExportSummary)> {
    let (value, summary) = to_json_value(table);
    Ok((serde_json::to_string_pretty(&value)?, summary))
}

/// Read a JSON document into a table.
pub fn read_json<R: Read>(reader: R) -> Result<PredxTable> {
    let value: Value = serde_json::from_reader(reader)?;
    from_json_value(&value)
}

/// Decode a JSON document.
///
/// The document must be an array; each element that cannot be decoded
/// becomes a record with a format error.
pub fn from_json_value(value: &Value) -> Result<PredxTable> {
    let elements = value
        .as_array()
        .ok_or_else(|| serde_json::Error::custom("predx JSON must be an array of records"))?;

    let table: PredxTable = elements.iter().map(decode_record).collect();
    tracing::info!(
        records = table.len(),
        errors = table.error_count(),
        "decoded json table"
    );
    Ok(table)
}

fn decode_record(element: &Value) -> PredxRecord {
    let Some(object) = element.as_object() else {
        return PredxRecord::failed(
            RowKey::new(),
            "NA",
            RecordError::Format("record is not an object".to_string()),
        );
    };

    let key: RowKey = object
        .iter()
        .filter(|(field, _)| *field != CLASS_FIELD && *field != PAYLOAD_FIELD)
        .map(|(field, v)| (field.clone(), key_text(v)))
        .collect();

    let tag = match object.get(CLASS_FIELD) {
        Some(Value::String(tag)) => tag.trim().to_string(),
        _ => {
            return PredxRecord::failed(
                key,
                "NA",
                RecordError::Format(format!("missing {}", CLASS_FIELD)),
            );
        }
    };

    let decoded = tag.parse::<PredxClass>().and_then(|class| {
        let payload = object
            .get(PAYLOAD_FIELD)
            .and_then(Value::as_object)
            .ok_or_else(|| RecordError::Format(format!("missing {} payload", PAYLOAD_FIELD)))?;
        decode_payload(class, payload)
    });

    match decoded {
        Ok(value) => PredxRecord::new(key, value),
        Err(error) => PredxRecord::failed(key, tag, error),
    }
}

fn decode_payload(
    class: PredxClass,
    payload: &Map<String, Value>,
) -> std::result::Result<Predx, RecordError> {
    let value: Predx = match class {
        PredxClass::Point => Point::new(number(payload, "point")?)?.into(),
        PredxClass::Binary => Binary::new(number(payload, "prob")?)?.into(),
        PredxClass::BinCat => {
            let cats = texts(payload, "cat")?;
            let probs = numbers(payload, "prob")?;
            same_length(cats.len(), probs.len(), "cat")?;
            BinCat::new(cats.into_iter().zip(probs).collect())?.into()
        }
        PredxClass::BinLwr => {
            let lwrs = numbers(payload, "lwr")?;
            let probs = numbers(payload, "prob")?;
            same_length(lwrs.len(), probs.len(), "lwr")?;
            BinLwr::new(lwrs.into_iter().zip(probs).collect())?.into()
        }
        PredxClass::Sample => Sample::new(numbers(payload, "sample")?)?.into(),
    };
    Ok(value)
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NA".to_string(),
        other => other.to_string(),
    }
}

fn field<'a>(
    payload: &'a Map<String, Value>,
    name: &str,
) -> std::result::Result<&'a Value, RecordError> {
    payload
        .get(name)
        .ok_or_else(|| RecordError::Format(format!("missing field '{}'", name)))
}

/// A scalar number; null and missing markers become NaN.
fn as_number(value: &Value, name: &str) -> std::result::Result<f64, RecordError> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| RecordError::Format(format!("field '{}' is out of range", name))),
        Value::String(s) if is_missing(s) => Ok(f64::NAN),
        other => Err(RecordError::Format(format!(
            "field '{}' expects a number, found {}",
            name, other
        ))),
    }
}

fn number(payload: &Map<String, Value>, name: &str) -> std::result::Result<f64, RecordError> {
    as_number(field(payload, name)?, name)
}

fn array<'a>(
    payload: &'a Map<String, Value>,
    name: &str,
) -> std::result::Result<&'a Vec<Value>, RecordError> {
    field(payload, name)?
        .as_array()
        .ok_or_else(|| RecordError::Format(format!("field '{}' expects an array", name)))
}

fn numbers(payload: &Map<String, Value>, name: &str) -> std::result::Result<Vec<f64>, RecordError> {
    array(payload, name)?
        .iter()
        .map(|v| as_number(v, name))
        .collect()
}

fn texts(payload: &Map<String, Value>, name: &str) -> std::result::Result<Vec<String>, RecordError> {
    Ok(array(payload, name)?.iter().map(key_text).collect())
}

fn same_length(bins: usize, probs: usize, name: &str) -> std::result::Result<(), RecordError> {
    if bins == probs {
        Ok(())
    } else {
        Err(RecordError::Format(format!(
            "'{}' has {} entries but 'prob' has {}",
            name, bins, probs
        )))
    }
}
