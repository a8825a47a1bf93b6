pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Render a scalar (or small array) as a single cell.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Result fields split into scalar rows (nested objects flattened to
/// `parent.child`) and named arrays of row objects such as `cash_flows`.
pub(crate) fn split_result(
    result: &serde_json::Map<String, Value>,
) -> (Vec<(String, String)>, Vec<(&str, &[Value])>) {
    let mut fields = Vec::new();
    let mut row_sets = Vec::new();

    for (key, val) in result {
        match val {
            Value::Object(inner) => {
                for (k, v) in inner {
                    fields.push((format!("{key}.{k}"), format_value(v)));
                }
            }
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                row_sets.push((key.as_str(), rows.as_slice()));
            }
            _ => fields.push((key.clone(), format_value(val))),
        }
    }

    (fields, row_sets)
}

/// Header row taken from the first object's keys.
pub(crate) fn row_headers(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Cells of one row object in header order.
pub(crate) fn row_cells(row: &Value, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(format_value).unwrap_or_default())
        .collect()
}
