//! Layout contract of the input workbook.
//!
//! Every sheet name, label and row/column offset the loader depends on is
//! declared here. Row offsets are relative to the first data row of each
//! section (after its header rows); column offsets are relative to the first
//! data column.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Rate;

/// Explicit forecast horizon, in years.
pub const FORECAST_YEARS: u32 = 5;

/// Fiscal year of the workbook's base-year column.
pub const BASE_YEAR: i32 = 2025;

/// Annual inflation applied to fixed operating expenses. Structural, not a
/// workbook input.
// TODO: move into the assumptions sheet once the workbook template gains a row for it.
pub const FIXED_COST_INFLATION: Rate = dec!(0.03);

/// Day basis of the receivables/inventory/payables turnover ratios.
pub const DAYS_PER_YEAR: Decimal = dec!(365);

/// Position of a section's data block inside its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOrigin {
    /// Sheet rows preceding the first data row.
    pub header_rows: usize,
    /// Sheet columns preceding the first data column.
    pub label_cols: usize,
}

impl GridOrigin {
    pub const fn cell(&self, data_row: usize, data_col: usize) -> (usize, usize) {
        (self.header_rows + data_row, self.label_cols + data_col)
    }
}

// ---------------------------------------------------------------------------
// Base assumptions
// ---------------------------------------------------------------------------

pub const ASSUMPTIONS_SHEET: &str = "Hipotesis_Base";

/// Labels in column A, values in column B, no header row.
pub const ASSUMPTIONS_ORIGIN: GridOrigin = GridOrigin {
    header_rows: 0,
    label_cols: 1,
};

/// Scalar parameters of the base-assumptions section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionField {
    BaseRevenue,
    BaseFixedOpex,
    ReceivableDays,
    InventoryDays,
    PayableDays,
    Wacc,
    PerpetuityGrowth,
    TaxRate,
    DepreciationPct,
    CapexPct,
}

pub struct AssumptionCell {
    pub field: AssumptionField,
    /// Label after normalization (see [`normalize_label`]).
    pub label: &'static str,
    pub is_percentage: bool,
}

pub const ASSUMPTION_FIELDS: [AssumptionCell; 10] = [
    AssumptionCell { field: AssumptionField::BaseRevenue, label: "ingresos_totales_2025", is_percentage: false },
    AssumptionCell { field: AssumptionField::BaseFixedOpex, label: "gastos_fijos_operativos_2025", is_percentage: false },
    AssumptionCell { field: AssumptionField::ReceivableDays, label: "dias_cxc", is_percentage: false },
    AssumptionCell { field: AssumptionField::InventoryDays, label: "dias_inv", is_percentage: false },
    AssumptionCell { field: AssumptionField::PayableDays, label: "dias_cxp", is_percentage: false },
    AssumptionCell { field: AssumptionField::Wacc, label: "wacc", is_percentage: true },
    AssumptionCell { field: AssumptionField::PerpetuityGrowth, label: "g-tasa_de_crecimiento_a_perpetuidad", is_percentage: true },
    AssumptionCell { field: AssumptionField::TaxRate, label: "tasa_isr", is_percentage: true },
    AssumptionCell { field: AssumptionField::DepreciationPct, label: "dep_pct_base", is_percentage: true },
    AssumptionCell { field: AssumptionField::CapexPct, label: "capex_pct_base", is_percentage: true },
];

/// Trim, lower-case and replace spaces with underscores.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

// ---------------------------------------------------------------------------
// Detailed projection drivers
// ---------------------------------------------------------------------------

pub const DRIVERS_SHEET: &str = "Proyecciones_Detalladas";

/// One header row; column A holds row labels, column B is the base year and
/// columns C.. are forecast years 1..N.
pub const DRIVERS_ORIGIN: GridOrigin = GridOrigin {
    header_rows: 1,
    label_cols: 1,
};

/// Data column of the base year; forecast year `t` sits in data column `t`.
pub const DRIVERS_BASE_YEAR_COL: usize = 0;

/// Rows of one revenue stream inside the drivers section.
pub struct StreamRows {
    pub name: &'static str,
    pub base_level_row: usize,
    pub growth_row: usize,
    pub cost_ratio_row: usize,
}

pub const REVENUE_STREAMS: [StreamRows; 3] = [
    StreamRows { name: "Binomio 1", base_level_row: 1, growth_row: 2, cost_ratio_row: 3 },
    StreamRows { name: "Binomio 2", base_level_row: 5, growth_row: 6, cost_ratio_row: 7 },
    StreamRows { name: "General", base_level_row: 9, growth_row: 10, cost_ratio_row: 11 },
];

/// Variable operating expenses as a share of base revenue.
pub const VARIABLE_EXPENSE_ROW: usize = 13;

// ---------------------------------------------------------------------------
// Project impact
// ---------------------------------------------------------------------------

pub const IMPACT_SHEET: &str = "Impacto_Proyectos";

/// Two skipped header rows; the forecast years occupy columns D..H.
pub const IMPACT_ORIGIN: GridOrigin = GridOrigin {
    header_rows: 2,
    label_cols: 3,
};

/// Number of forecast-year columns in the project-impact block.
pub const IMPACT_YEAR_COLS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactField {
    Capex,
    AdditionalRevenue,
    OpexSavings,
    AdditionalDepreciation,
}

pub struct ImpactRow {
    pub field: ImpactField,
    pub name: &'static str,
    pub row: usize,
}

pub const IMPACT_ROWS: [ImpactRow; 4] = [
    ImpactRow { field: ImpactField::Capex, name: "capex_inversion", row: 0 },
    ImpactRow { field: ImpactField::AdditionalRevenue, name: "ingresos_adicionales", row: 4 },
    ImpactRow { field: ImpactField::OpexSavings, name: "gastos_ahorros_operativos", row: 8 },
    ImpactRow { field: ImpactField::AdditionalDepreciation, name: "depreciacion_adicional", row: 12 },
];

/// Spreadsheet-style column letters for diagnostics (0 -> A, 26 -> AA).
pub fn column_letter(col: usize) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// A1-style reference of an absolute, zero-based position.
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row + 1)
}
