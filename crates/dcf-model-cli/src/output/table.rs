use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell_text, classify, warnings_of, Shape};

pub fn print_table(value: &Value) {
    match classify(value) {
        Shape::Run(run) => print_run(run),
        Shape::Grid(grid) => println!("{}", grid_table(grid)),
        Shape::Tables(tables) => print_labeled_tables(tables),
        Shape::Years(rows) => println!("{}", years_table(rows)),
        Shape::Record(map) => println!("{}", record_table(map)),
        Shape::Scalar(v) => println!("{}", display(v)),
    }

    let warnings = warnings_of(value);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in warnings {
            println!("  - {}", w);
        }
    }
    if let Some(methodology) = value.get("methodology").and_then(Value::as_str) {
        println!("\nMethodology: {}", methodology);
    }
}

fn print_run(run: &Map<String, Value>) {
    if let Some(Value::Object(summary)) = run.get("summary") {
        println!("{}", record_table(summary));
    }
    if let Some(Value::Array(years)) = run.get("projection") {
        println!("\nProjection");
        println!("{}", years_table(years));
    }
    if let Some(Value::Array(rows)) = run.get("project_analysis") {
        if !rows.is_empty() {
            println!("\nProject analysis");
            println!("{}", years_table(rows));
        }
    }
}

/// Decimal strings rounded for reading: cents for amounts, four places for
/// fractions. Anything that is not a number is shown as is.
fn display(value: &Value) -> String {
    let text = cell_text(value);
    match text.parse::<Decimal>() {
        Ok(d) => {
            let dp = if d.abs() >= Decimal::ONE { 2 } else { 4 };
            d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
                .to_string()
        }
        Err(_) => text,
    }
}

/// Field/value rows; nested objects become dotted keys.
fn record_table(map: &Map<String, Value>) -> Table {
    let mut rows = Vec::new();
    flatten("", map, &mut rows);
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    builder.build()
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten(&path, inner, out),
            other => out.push((path, display(other))),
        }
    }
}

/// Years across the top, line items down the side, the way the workbook
/// lays out its projection sheet. Array fields expand to one line each.
fn years_table(rows: &[Value]) -> Table {
    let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
    let mut builder = Builder::default();
    let Some(first) = objects.first() else {
        builder.push_record(["(empty)"]);
        return builder.build();
    };

    let header = std::iter::once(String::new())
        .chain(objects.iter().map(|o| o.get("year").map(cell_text).unwrap_or_default()));
    builder.push_record(header);

    for key in first.keys().filter(|k| k.as_str() != "year") {
        let width = first.get(key).and_then(Value::as_array).map(Vec::len);
        match width {
            Some(n) => {
                for i in 0..n {
                    let cells = objects.iter().map(|o| {
                        o.get(key)
                            .and_then(|v| v.get(i))
                            .map(display)
                            .unwrap_or_default()
                    });
                    builder.push_record(std::iter::once(format!("{}[{}]", key, i)).chain(cells));
                }
            }
            None => {
                let cells = objects
                    .iter()
                    .map(|o| o.get(key).map(display).unwrap_or_default());
                builder.push_record(std::iter::once(key.clone()).chain(cells));
            }
        }
    }
    builder.build()
}

/// WACC down the side, growth across the top; blank where not convergent.
fn grid_table(grid: &Map<String, Value>) -> Table {
    let empty = Vec::new();
    let wacc_values = grid.get("wacc_values").and_then(Value::as_array).unwrap_or(&empty);
    let growth_values = grid.get("growth_values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("wacc \\ g".to_string()).chain(growth_values.iter().map(display)),
    );
    for (wacc, row) in wacc_values.iter().zip(matrix) {
        let cells = row.as_array().unwrap_or(&empty);
        builder.push_record(std::iter::once(display(wacc)).chain(cells.iter().map(display)));
    }
    builder.build()
}

/// One table per exported sheet, headed by its name. Cells are already
/// formatted by the model.
fn print_labeled_tables(tables: &[Value]) {
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if let Some(name) = table.get("name").and_then(Value::as_str) {
            println!("{}", name);
        }
        let mut builder = Builder::default();
        if let Some(Value::Array(headers)) = table.get("headers") {
            builder.push_record(headers.iter().map(cell_text));
        }
        for row in table.get("rows").and_then(Value::as_array).into_iter().flatten() {
            if let Value::Array(cells) = row {
                builder.push_record(cells.iter().map(cell_text));
            }
        }
        println!("{}", builder.build());
    }
}
