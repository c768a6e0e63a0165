//! Cell value normalization.
//!
//! Every numeric parameter in the workbook passes through [`normalize`].
//! Blank and unparseable cells become zero; unparseable ones also carry a
//! [`NormalizeDiagnostic`] so callers can choose strict or lenient handling.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::workbook::Cell;

/// Characters removed from text cells before parsing.
const STRIPPED_SYMBOLS: [char; 4] = ['$', '€', '£', ','];

/// Why a cell was absorbed to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeDiagnostic {
    /// Text that does not parse as a number after cleaning.
    Unparseable { raw: String },
    /// A spreadsheet error literal (`#REF!`, `#DIV/0!`, ...).
    ErrorCell { code: String },
}

impl std::fmt::Display for NormalizeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeDiagnostic::Unparseable { raw } => {
                write!(f, "unparseable value '{raw}' read as 0")
            }
            NormalizeDiagnostic::ErrorCell { code } => {
                write!(f, "error cell {code} read as 0")
            }
        }
    }
}

/// Normalized numeric value plus an optional diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub value: Decimal,
    pub diagnostic: Option<NormalizeDiagnostic>,
}

impl Normalized {
    fn ok(value: Decimal) -> Self {
        Normalized {
            value,
            diagnostic: None,
        }
    }

    fn zero_with(diagnostic: NormalizeDiagnostic) -> Self {
        Normalized {
            value: Decimal::ZERO,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Convert a cell into a decimal.
///
/// A trailing `%` forces percentage interpretation. Under percentage
/// interpretation a magnitude above 1 is divided by 100, so `30`, `"30"` and
/// `"30%"` all become `0.30` while `0.30` is left as is.
pub fn normalize(cell: &Cell, is_percentage: bool) -> Normalized {
    match cell {
        Cell::Empty => Normalized::ok(Decimal::ZERO),
        Cell::Number(n) => Normalized::ok(apply_percentage(*n, is_percentage)),
        Cell::Bool(b) => Normalized::ok(apply_percentage(Decimal::from(u8::from(*b)), is_percentage)),
        Cell::Error(code) => Normalized::zero_with(NormalizeDiagnostic::ErrorCell {
            code: code.clone(),
        }),
        Cell::Text(raw) => normalize_text(raw, is_percentage),
    }
}

/// Lenient shorthand: the value only, diagnostics dropped.
pub fn normalize_value(cell: &Cell, is_percentage: bool) -> Decimal {
    normalize(cell, is_percentage).value
}

fn normalize_text(raw: &str, is_percentage: bool) -> Normalized {
    if raw.trim().is_empty() {
        return Normalized::ok(Decimal::ZERO);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| !STRIPPED_SYMBOLS.contains(c))
        .collect();
    let mut body = cleaned.trim();
    let mut is_percentage = is_percentage;
    if let Some(stripped) = body.strip_suffix('%') {
        is_percentage = true;
        body = stripped.trim_end();
    }

    match parse_decimal(body) {
        Some(value) => Normalized::ok(apply_percentage(value, is_percentage)),
        None => Normalized::zero_with(NormalizeDiagnostic::Unparseable {
            raw: raw.to_string(),
        }),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn apply_percentage(value: Decimal, is_percentage: bool) -> Decimal {
    if is_percentage && value.abs() > Decimal::ONE {
        value / dec!(100)
    } else {
        value
    }
}
