//! Tolerant decoding of the stored entry payload.
//!
//! The payload is a JSON array of entry objects. Missing or malformed
//! fields are normalized to defaults here so the aggregation engine only
//! ever sees well-typed entries.

use crate::models::{Entry, UNKNOWN_NAME};
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to turn the stored text into a list of entries.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The text is not valid JSON.
    #[error("stored data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The JSON is neither an array nor an object.
    #[error("stored data must be an array or an object, found {0}")]
    UnexpectedShape(&'static str),
}

/// Decode the stored payload.
///
/// A single object is accepted as a one-element list. `today` fills in
/// entries without a usable date.
pub fn decode_entries(text: &str, today: NaiveDate) -> Result<Vec<Entry>, DecodeError> {
    let value: Value = serde_json::from_str(text)?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => {
            debug!("Stored data is a single object, wrapping it in a list");
            vec![object]
        }
        other => return Err(DecodeError::UnexpectedShape(json_kind(&other))),
    };

    let entries: Vec<Entry> = items
        .iter()
        .map(|item| normalize_entry(item, today))
        .collect();

    debug!("Decoded {} entries", entries.len());
    Ok(entries)
}

/// Normalize one stored item into an entry.
///
/// - `name`: trimmed non-empty string, else [`UNKNOWN_NAME`]
/// - `date`: `YYYY-MM-DD` string, else `today`
/// - counters: coerced to a number, else 0; negatives become 0 and
///   fractions are truncated
/// - `tbtAmount`: coerced the same way but keeps its fraction
pub fn normalize_entry(item: &Value, today: NaiveDate) -> Entry {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string();

    let date = match item.get("date").and_then(Value::as_str) {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
            warn!("Entry for {} has invalid date '{}', using {}", name, raw, today);
            today
        }),
        None => today,
    };

    Entry {
        websites: coerce_count(item.get("websites")),
        orders: coerce_count(item.get("orders")),
        main_products: coerce_count(item.get("mainProducts")),
        ac_count: coerce_count(item.get("acCount")),
        tbt_amount: coerce_amount(item.get("tbtAmount")),
        name,
        date,
    }
}

/// Read a field as a number, falling back to 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    };

    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Counts beyond `u64::MAX` clamp to it.
fn coerce_count(value: Option<&Value>) -> u64 {
    let number = coerce_number(value);
    if number <= 0.0 {
        0
    } else if number >= u64::MAX as f64 {
        u64::MAX
    } else {
        number.trunc() as u64
    }
}

fn coerce_amount(value: Option<&Value>) -> f64 {
    coerce_number(value).max(0.0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
