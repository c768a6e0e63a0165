use serde_json::{Map, Value};

use super::{cell_text, classify, Shape};

/// The one number a shell script wants from each command.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    match classify(value) {
        Shape::Run(run) => run
            .get("summary")
            .and_then(|s| s.get("enterprise_value"))
            .map(cell_text)
            .unwrap_or_default(),
        Shape::Grid(grid) => field(grid, "base_case_value"),
        Shape::Tables(tables) => tables
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(","),
        // Terminal-year free cash flow
        Shape::Years(rows) => rows
            .last()
            .and_then(|r| r.get("fcf").or_else(|| r.get("fcf_total")))
            .map(cell_text)
            .unwrap_or_default(),
        Shape::Record(map) => match (map.get("enterprise_value"), map.get("status")) {
            (Some(ev), _) if !ev.is_null() => cell_text(ev),
            (_, Some(status)) => status_text(status),
            _ => Value::Object(map.clone()).to_string(),
        },
        Shape::Scalar(v) => cell_text(v),
    }
}

/// `ready`, `not_loaded` or `failed: <reason>`.
fn status_text(status: &Value) -> String {
    let tag = status.get("status").map(cell_text).unwrap_or_else(|| cell_text(status));
    match status.get("reason").and_then(Value::as_str) {
        Some(reason) => format!("{}: {}", tag, reason),
        None => tag,
    }
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).map(cell_text).unwrap_or_default()
}
