use std::collections::HashMap;
use std::path::Path;

use acroform::{FieldValue, FillOptions, fill_form_with_report};
use serde_json::Value;
use tracing::debug;

use crate::shared::read_file;

pub fn run(
    file: &Path,
    output: &Path,
    set: &[String],
    values_file: Option<&Path>,
    flatten: bool,
) -> Result<(), i32> {
    let bytes = read_file(file)?;

    let mut values = HashMap::new();
    if let Some(path) = values_file {
        let text = read_file(path)?;
        values.extend(parse_values_json(&text).map_err(|e| {
            eprintln!("Error: {}: {e}", path.display());
            1
        })?);
    }
    for assignment in set {
        let (name, value) = parse_assignment(assignment).map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;
        values.insert(name, value);
    }
    debug!(values = values.len(), "fill values collected");

    let result = fill_form_with_report(&bytes, &values, &FillOptions { flatten }).map_err(|e| {
        eprintln!("Error: failed to fill PDF: {e}");
        1
    })?;

    std::fs::write(output, &result.value.bytes).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", output.display());
        1
    })?;

    let report = result.value.report;
    eprintln!(
        "filled {}, skipped {}, failed {}{}",
        report.filled,
        report.skipped,
        report.failed,
        if flatten && !result.value.flattened {
            " (flatten failed, form left interactive)"
        } else {
            ""
        }
    );
    Ok(())
}

/// Parse `NAME=VALUE`. The value is kept as text; checkboxes read
/// `true`/`on` as checked.
pub fn parse_assignment(input: &str) -> Result<(String, FieldValue), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{input}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{input}'"));
    }
    Ok((name.to_string(), FieldValue::Text(value.to_string())))
}

/// Parse a JSON object of field values.
///
/// Strings and numbers become text, booleans become checkbox states and
/// `null` entries are left out so the field is not touched.
pub fn parse_values_json(bytes: &[u8]) -> Result<HashMap<String, FieldValue>, String> {
    let parsed: Value = serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {e}"))?;
    let Value::Object(map) = parsed else {
        return Err("expected a JSON object of field values".to_string());
    };

    let mut values = HashMap::new();
    for (name, value) in map {
        let value = match value {
            Value::Null => continue,
            Value::Bool(b) => FieldValue::Checked(b),
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => FieldValue::Text(n.to_string()),
            other => return Err(format!("unsupported value for '{name}': {other}")),
        };
        values.insert(name, value);
    }
    Ok(values)
}
