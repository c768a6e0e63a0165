pub mod csv_out;
pub mod minimal;
pub mod table;

use std::io::{self, Write};

use serde_json::{Map, Value};

use crate::OutputFormat;

/// What a command printed, as far as the non-JSON formatters care.
pub enum Shape<'a> {
    /// Full run: summary, per-year projection and project analysis
    Run(&'a Map<String, Value>),
    /// WACC x growth sensitivity grid
    Grid(&'a Map<String, Value>),
    /// Named export tables
    Tables(&'a [Value]),
    /// One object per forecast year
    Years(&'a [Value]),
    Record(&'a Map<String, Value>),
    Scalar(&'a Value),
}

/// Strip the computation envelope, if any, and classify the payload.
pub fn classify(value: &Value) -> Shape<'_> {
    let payload = result_of(value);
    match payload {
        Value::Object(map) if map.contains_key("projection") && map.contains_key("summary") => {
            Shape::Run(map)
        }
        Value::Object(map) if map.contains_key("matrix") => Shape::Grid(map),
        Value::Object(map) => match map.get("tables") {
            Some(Value::Array(tables)) => Shape::Tables(tables),
            _ => Shape::Record(map),
        },
        Value::Array(rows) => Shape::Years(rows),
        other => Shape::Scalar(other),
    }
}

/// The `result` of an envelope, or the value itself.
pub fn result_of(value: &Value) -> &Value {
    match value {
        Value::Object(map) if map.contains_key("metadata") => map.get("result").unwrap_or(value),
        _ => value,
    }
}

/// Envelope warnings, empty when there is no envelope.
pub fn warnings_of(value: &Value) -> Vec<&str> {
    value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|w| w.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Plain cell text. Decimals arrive as strings and pass through untouched.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join("; "),
        Value::Object(_) => value.to_string(),
    }
}

fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out));
    if let Err(e) = written {
        eprintln!("failed to write JSON: {}", e);
    }
}

pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
