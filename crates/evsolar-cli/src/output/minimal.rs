use serde_json::Value;

use super::format_value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object. A bare schedule prints the final
/// cumulative cash flow.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "npv",
        "irr_pct",
        "payback_period_years",
        "monthly_payment",
        "base_case_value",
    ];

    match result_obj {
        Value::Object(map) => {
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_value(val));
                        return;
                    }
                }
            }

            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_value(val));
                return;
            }
        }
        Value::Array(rows) => {
            if let Some(cumulative) = rows.last().and_then(|r| r.get("cumulative_cash_flow")) {
                println!("{}", format_value(cumulative));
                return;
            }
        }
        _ => {}
    }

    println!("{}", format_value(result_obj));
}
