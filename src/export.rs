//! CSV export with a byte-exact layout: the header row is the first
//! record's keys comma-joined unquoted; every data field is stringified
//! (null -> empty), inner quotes doubled, and wrapped in double quotes.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{PosError, Result};

/// Render `records` as CSV. Relies on `serde_json`'s order-preserving maps,
/// so column order follows the first record's field order. An empty slice
/// produces an empty string.
pub fn to_csv<T: Serialize>(records: &[T]) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let rows: Vec<Value> = records
        .iter()
        .map(|r| {
            serde_json::to_value(r)
                .map_err(|e| PosError::Internal(format!("serialize record: {e}")))
        })
        .collect::<Result<_>>()?;

    let headers: Vec<String> = match &rows[0] {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => {
            return Err(PosError::InvalidArgument(
                "CSV records must serialize to objects".to_string(),
            ))
        }
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));

    for row in &rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|key| {
                let value = row.get(key).unwrap_or(&Value::Null);
                format!("\"{}\"", field_string(value).replace('"', "\"\""))
            })
            .collect();
        lines.push(fields.join(","));
    }

    Ok(lines.join("\n"))
}

fn field_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested shapes are not expected in export records; fall back to JSON.
        other => other.to_string(),
    }
}
