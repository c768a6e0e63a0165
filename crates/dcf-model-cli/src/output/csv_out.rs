use std::io;

use serde_json::{Map, Value};

use super::{cell_text, classify, Shape};

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// CSV on stdout at full decimal precision.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    let written = match classify(value) {
        Shape::Run(run) => match run.get("projection") {
            Some(Value::Array(years)) => write_years(&mut wtr, years),
            _ => write_record(&mut wtr, run),
        },
        Shape::Grid(grid) => write_grid(&mut wtr, grid),
        Shape::Tables(tables) => write_labeled_tables(&mut wtr, tables),
        Shape::Years(rows) => write_years(&mut wtr, rows),
        Shape::Record(map) => write_record(&mut wtr, map),
        Shape::Scalar(v) => wtr.write_record([cell_text(v)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("failed to write CSV: {}", e);
    }
}

fn write_record(wtr: &mut CsvWriter<'_>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &cell_text(val)])?;
    }
    Ok(())
}

/// One record per year. Array fields spread over indexed columns so each
/// revenue stream gets its own column.
fn write_years(wtr: &mut CsvWriter<'_>, rows: &[Value]) -> csv::Result<()> {
    let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
    let Some(first) = objects.first() else {
        return Ok(());
    };

    let columns: Vec<(String, Option<usize>)> = first
        .iter()
        .flat_map(|(key, val)| match val.as_array() {
            Some(items) => (0..items.len())
                .map(|i| (key.clone(), Some(i)))
                .collect::<Vec<_>>(),
            None => vec![(key.clone(), None)],
        })
        .collect();

    let header = columns.iter().map(|(key, idx)| match idx {
        Some(i) => format!("{}_{}", key, i),
        None => key.clone(),
    });
    wtr.write_record(header)?;

    for obj in objects {
        let record = columns.iter().map(|(key, idx)| {
            let field = obj.get(key);
            let cell = match idx {
                Some(i) => field.and_then(|v| v.get(*i)),
                None => field,
            };
            cell.map(cell_text).unwrap_or_default()
        });
        wtr.write_record(record)?;
    }
    Ok(())
}

/// Tables one after another, each preceded by a one-cell name record.
fn write_labeled_tables(wtr: &mut CsvWriter<'_>, tables: &[Value]) -> csv::Result<()> {
    for table in tables {
        let name = table.get("name").map(cell_text).unwrap_or_default();
        wtr.write_record([name])?;
        if let Some(Value::Array(headers)) = table.get("headers") {
            wtr.write_record(headers.iter().map(cell_text))?;
        }
        for row in table.get("rows").and_then(Value::as_array).into_iter().flatten() {
            if let Value::Array(cells) = row {
                wtr.write_record(cells.iter().map(cell_text))?;
            }
        }
    }
    Ok(())
}

/// Long format: one record per (wacc, growth) point, empty where the
/// terminal value does not converge.
fn write_grid(wtr: &mut CsvWriter<'_>, grid: &Map<String, Value>) -> csv::Result<()> {
    let empty = Vec::new();
    let wacc_values = grid.get("wacc_values").and_then(Value::as_array).unwrap_or(&empty);
    let growth_values = grid.get("growth_values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    wtr.write_record(["wacc", "growth", "enterprise_value"])?;
    for (wacc, row) in wacc_values.iter().zip(matrix) {
        let cells = row.as_array().unwrap_or(&empty);
        for (growth, ev) in growth_values.iter().zip(cells) {
            wtr.write_record([cell_text(wacc), cell_text(growth), cell_text(ev)])?;
        }
    }
    Ok(())
}
