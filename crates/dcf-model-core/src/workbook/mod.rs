//! Owned, format-independent view of the input workbook.
//!
//! Every sheet is copied into a [`Grid`] anchored at cell A1 so that the
//! loader can address cells by absolute, zero-based row/column positions.

#[cfg(feature = "xlsx")]
mod xlsx;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[cfg(feature = "xlsx")]
use std::path::Path;

#[cfg(feature = "xlsx")]
use crate::error::LoadError;

static EMPTY: Cell = Cell::Empty;

/// A single cell value as read from the spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Number(Decimal),
    Text(String),
    Bool(bool),
    /// Spreadsheet error literal such as `#DIV/0!`
    Error(String),
}

impl Cell {
    /// Convert a float cell. NaN and infinities read as blanks; finite values
    /// outside the decimal range become a `#NUM!` error cell.
    pub fn from_f64(value: f64) -> Self {
        match Decimal::from_f64(value) {
            Some(d) => Cell::Number(d),
            None if value.is_finite() => Cell::Error("#NUM!".to_string()),
            None => Cell::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text used when the cell acts as a row label.
    pub fn label_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Error(e) => e.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Decimal> for Cell {
    fn from(d: Decimal) -> Self {
        Cell::Number(d)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Number(Decimal::from(i))
    }
}

/// Rectangular cell grid; rows may be ragged, missing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Grid { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at an absolute position, or `None` when the position lies
    /// outside the used grid.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if col >= self.width() {
            return None;
        }
        self.rows
            .get(row)
            .map(|cells| cells.get(col).unwrap_or(&EMPTY))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// A set of named sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<(String, Grid)>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every sheet of an xlsx/xlsm/xlsb/xls/ods file into memory.
    #[cfg(feature = "xlsx")]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        xlsx::read_path(path.as_ref())
    }

    /// Same as [`Workbook::open`] for an in-memory upload.
    #[cfg(feature = "xlsx")]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        xlsx::read_bytes(bytes)
    }

    /// Insert or replace a sheet.
    pub fn insert_sheet(&mut self, name: impl Into<String>, grid: Grid) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = grid,
            None => self.sheets.push((name, grid)),
        }
    }

    pub fn with_sheet(mut self, name: impl Into<String>, grid: Grid) -> Self {
        self.insert_sheet(name, grid);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, grid)| grid)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }
}
