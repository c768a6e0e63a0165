use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use rust_decimal::Decimal;
use tracing::debug;

use super::{Cell, Grid, Workbook};
use crate::error::LoadError;

pub(super) fn read_path(path: &Path) -> Result<Workbook, LoadError> {
    let sheets = open_workbook_auto(path)
        .map_err(|e| LoadError::Workbook(format!("failed to open '{}': {e}", path.display())))?;
    collect_sheets(sheets)
}

pub(super) fn read_bytes(bytes: Vec<u8>) -> Result<Workbook, LoadError> {
    let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LoadError::Workbook(format!("failed to decode workbook: {e}")))?;
    collect_sheets(sheets)
}

// The reader is consumed here so the underlying file is closed on return.
fn collect_sheets<RS: Read + Seek>(mut sheets: Sheets<RS>) -> Result<Workbook, LoadError> {
    let mut workbook = Workbook::new();
    for name in sheets.sheet_names() {
        let range = sheets
            .worksheet_range(&name)
            .map_err(|e| LoadError::Workbook(format!("failed to read sheet '{name}': {e}")))?;
        let grid = grid_from_range(&range);
        debug!(sheet = %name, rows = grid.height(), cols = grid.width(), "read sheet");
        workbook.insert_sheet(name, grid);
    }
    Ok(workbook)
}

/// calamine ranges start at the first used cell; re-anchor at A1.
fn grid_from_range(range: &Range<Data>) -> Grid {
    let Some((row0, col0)) = range.start() else {
        return Grid::default();
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0 as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col0 as usize];
        cells.extend(row.iter().map(cell_from_data));
        rows.push(cells);
    }
    Grid::from_rows(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => Cell::from_f64(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => Cell::from_f64(dt.as_f64()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}
