use serde_json::Value;
use std::io;

use super::{format_value, row_cells, row_headers, split_result};

/// Write output as CSV to stdout.
///
/// Row sets (the cash-flow schedule) and sensitivity matrices are written as
/// proper tables; anything else becomes two-column `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                if !write_matrix_csv(&mut wtr, result) {
                    let (fields, row_sets) = split_result(result);
                    match row_sets.first() {
                        Some((_, rows)) => write_rows_csv(&mut wtr, rows),
                        None => write_fields_csv(&mut wtr, fields),
                    }
                }
            }
            _ => write_fields_csv(
                &mut wtr,
                map.iter().map(|(k, v)| (k.clone(), format_value(v))).collect(),
            ),
        },
        Value::Array(rows) => write_rows_csv(&mut wtr, rows),
        _ => {
            let _ = wtr.write_record([&format_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, fields: Vec<(String, String)>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in fields {
        let _ = wtr.write_record([key, val]);
    }
}

fn write_rows_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            let _ = wtr.write_record([&format_value(item)]);
        }
        return;
    }

    let _ = wtr.write_record(&headers);
    for row in rows {
        let _ = wtr.write_record(row_cells(row, &headers));
    }
}

/// Returns false when the result is not a sensitivity grid.
fn write_matrix_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    result: &serde_json::Map<String, Value>,
) -> bool {
    let (Some(Value::Array(matrix)), Some(Value::Array(v1)), Some(Value::Array(v2))) = (
        result.get("matrix"),
        result.get("variable_1_values"),
        result.get("variable_2_values"),
    ) else {
        return false;
    };

    let corner = result.get("variable_1").map(format_value).unwrap_or_default();
    let header: Vec<String> = std::iter::once(corner)
        .chain(v2.iter().map(format_value))
        .collect();
    let _ = wtr.write_record(&header);

    for (label, row) in v1.iter().zip(matrix) {
        let mut record = vec![format_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(|c| match c {
                Value::Null => String::new(),
                other => format_value(other),
            }));
        }
        let _ = wtr.write_record(&record);
    }
    true
}
