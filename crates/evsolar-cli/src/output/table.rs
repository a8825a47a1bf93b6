use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_value, row_cells, row_headers, split_result};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result_table(result, map),
            _ => print_fields(map.iter().map(|(k, v)| (k.clone(), format_value(v))).collect()),
        },
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    if let Some(grid) = sensitivity_grid(result) {
        println!("{}", grid);
    }

    let scalar_result: Map<String, Value> = result
        .iter()
        .filter(|(k, _)| !is_grid_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let (fields, row_sets) = split_result(&scalar_result);
    print_fields(fields);

    for (name, rows) in row_sets {
        println!("\n{}:", name);
        print_rows(rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(fields: Vec<(String, String)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field".to_string(), "Value".to_string()]);
    for (key, val) in fields {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            println!("{}", format_value(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        builder.push_record(row_cells(row, &headers));
    }
    println!("{}", Table::from(builder));
}

fn is_grid_key(key: &str) -> bool {
    matches!(key, "matrix" | "variable_1_values" | "variable_2_values")
}

/// Sensitivity matrix with variable_1 down the side and variable_2 across.
fn sensitivity_grid(result: &Map<String, Value>) -> Option<Table> {
    let rows = result.get("matrix")?.as_array()?;
    let v1 = result.get("variable_1_values")?.as_array()?;
    let v2 = result.get("variable_2_values")?.as_array()?;

    let corner = format!(
        "{} \\ {}",
        format_value(result.get("variable_1")?),
        format_value(result.get("variable_2")?)
    );

    let mut builder = Builder::default();
    builder.push_record(std::iter::once(corner).chain(v2.iter().map(format_value)));
    for (label, row) in v1.iter().zip(rows) {
        let cells = row.as_array().map(|r| r.iter().map(format_value).collect::<Vec<_>>());
        builder.push_record(
            std::iter::once(format_value(label)).chain(cells.unwrap_or_default()),
        );
    }
    Some(Table::from(builder))
}
