//! Workbook loader: fixed-schema sections into a [`ParameterBundle`].

pub mod schema;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::normalize::{normalize, NormalizeDiagnostic};
use crate::params::{BaseAssumptions, ParameterBundle, ProjectImpact, ProjectionDrivers, RevenueStream};
use crate::types::Rate;
use crate::workbook::{Cell, Grid, Workbook};

use schema::{
    AssumptionField, GridOrigin, ImpactField, ASSUMPTIONS_ORIGIN, ASSUMPTIONS_SHEET,
    ASSUMPTION_FIELDS, DRIVERS_BASE_YEAR_COL, DRIVERS_ORIGIN, DRIVERS_SHEET, FORECAST_YEARS,
    IMPACT_ORIGIN, IMPACT_ROWS, IMPACT_SHEET, IMPACT_YEAR_COLS, REVENUE_STREAMS,
    VARIABLE_EXPENSE_ROW,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Number of forecast-year columns to read.
    pub horizon_years: u32,
    /// Reject unparseable cells instead of reading them as zero.
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            horizon_years: FORECAST_YEARS,
            strict: false,
        }
    }
}

/// A cell that was absorbed to zero, with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWarning {
    pub section: String,
    pub cell: String,
    pub diagnostic: NormalizeDiagnostic,
}

impl std::fmt::Display for CellWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}: {}", self.section, self.cell, self.diagnostic)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedBundle {
    pub params: ParameterBundle,
    pub warnings: Vec<CellWarning>,
}

/// Load with the default five-year horizon and lenient cell parsing.
pub fn load(workbook: &Workbook) -> Result<LoadedBundle, LoadError> {
    load_with(workbook, &LoadOptions::default())
}

pub fn load_with(workbook: &Workbook, options: &LoadOptions) -> Result<LoadedBundle, LoadError> {
    let mut warnings = Vec::new();

    let base = {
        let mut reader = SectionReader::open(workbook, ASSUMPTIONS_SHEET, ASSUMPTIONS_ORIGIN, options, &mut warnings)?;
        read_assumptions(&mut reader)?
    };
    let drivers = {
        let mut reader = SectionReader::open(workbook, DRIVERS_SHEET, DRIVERS_ORIGIN, options, &mut warnings)?;
        read_drivers(&mut reader, options.horizon_years)?
    };
    let impact = {
        let mut reader = SectionReader::open(workbook, IMPACT_SHEET, IMPACT_ORIGIN, options, &mut warnings)?;
        read_impact(&mut reader, options.horizon_years)?
    };

    debug!(
        streams = drivers.streams.len(),
        horizon = options.horizon_years,
        warnings = warnings.len(),
        "workbook loaded"
    );

    Ok(LoadedBundle {
        params: ParameterBundle {
            base,
            drivers,
            impact,
        },
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Grid reader
// ---------------------------------------------------------------------------

/// Reads normalized values out of one section at schema-relative offsets.
struct SectionReader<'a> {
    section: &'static str,
    grid: &'a Grid,
    origin: GridOrigin,
    strict: bool,
    warnings: &'a mut Vec<CellWarning>,
}

impl<'a> SectionReader<'a> {
    fn open(
        workbook: &'a Workbook,
        section: &'static str,
        origin: GridOrigin,
        options: &LoadOptions,
        warnings: &'a mut Vec<CellWarning>,
    ) -> Result<Self, LoadError> {
        let grid = workbook
            .sheet(section)
            .ok_or_else(|| LoadError::missing_section(section))?;
        debug!(section, rows = grid.height(), cols = grid.width(), "reading section");
        Ok(SectionReader {
            section,
            grid,
            origin,
            strict: options.strict,
            warnings,
        })
    }

    fn absolute_cell(&self, row: usize, col: usize) -> Result<&'a Cell, LoadError> {
        self.grid.get(row, col).ok_or_else(|| {
            LoadError::malformed(
                self.section,
                format!(
                    "cell {} is outside the sheet ({} rows x {} columns)",
                    schema::cell_ref(row, col),
                    self.grid.height(),
                    self.grid.width()
                ),
            )
        })
    }

    fn value_at(&mut self, row: usize, col: usize, is_percentage: bool) -> Result<Decimal, LoadError> {
        let cell = self.absolute_cell(row, col)?;
        let normalized = normalize(cell, is_percentage);
        if let Some(diagnostic) = normalized.diagnostic {
            let warning = CellWarning {
                section: self.section.to_string(),
                cell: schema::cell_ref(row, col),
                diagnostic,
            };
            if self.strict {
                return Err(LoadError::malformed(self.section, warning.to_string()));
            }
            warn!(%warning, "cell read as zero");
            self.warnings.push(warning);
        }
        Ok(normalized.value)
    }

    /// Value at a data-relative position.
    fn read(&mut self, data_row: usize, data_col: usize, is_percentage: bool) -> Result<Decimal, LoadError> {
        let (row, col) = self.origin.cell(data_row, data_col);
        self.value_at(row, col, is_percentage)
    }

    /// `count` consecutive values of one data row starting at `first_col`.
    fn read_row(
        &mut self,
        data_row: usize,
        first_col: usize,
        count: usize,
        is_percentage: bool,
    ) -> Result<Vec<Decimal>, LoadError> {
        (first_col..first_col + count)
            .map(|col| self.read(data_row, col, is_percentage))
            .collect()
    }

    /// Value next to the first row whose normalized label matches.
    fn read_labeled(&mut self, label: &str, is_percentage: bool) -> Result<Decimal, LoadError> {
        let label_col = self.origin.label_cols.saturating_sub(1);
        let row = self
            .grid
            .rows()
            .position(|cells| {
                cells
                    .get(label_col)
                    .map(|c| schema::normalize_label(&c.label_text()) == label)
                    .unwrap_or(false)
            })
            .ok_or_else(|| LoadError::missing_label(self.section, label))?;
        self.value_at(row, self.origin.label_cols, is_percentage)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn read_assumptions(reader: &mut SectionReader<'_>) -> Result<BaseAssumptions, LoadError> {
    let mut base = BaseAssumptions {
        base_revenue: Decimal::ZERO,
        base_fixed_opex: Decimal::ZERO,
        receivable_days: Decimal::ZERO,
        inventory_days: Decimal::ZERO,
        payable_days: Decimal::ZERO,
        wacc: Decimal::ZERO,
        perpetuity_growth: Decimal::ZERO,
        tax_rate: Decimal::ZERO,
        depreciation_pct: Decimal::ZERO,
        capex_pct: Decimal::ZERO,
    };

    for entry in &ASSUMPTION_FIELDS {
        let value = reader.read_labeled(entry.label, entry.is_percentage)?;
        let slot = match entry.field {
            AssumptionField::BaseRevenue => &mut base.base_revenue,
            AssumptionField::BaseFixedOpex => &mut base.base_fixed_opex,
            AssumptionField::ReceivableDays => &mut base.receivable_days,
            AssumptionField::InventoryDays => &mut base.inventory_days,
            AssumptionField::PayableDays => &mut base.payable_days,
            AssumptionField::Wacc => &mut base.wacc,
            AssumptionField::PerpetuityGrowth => &mut base.perpetuity_growth,
            AssumptionField::TaxRate => &mut base.tax_rate,
            AssumptionField::DepreciationPct => &mut base.depreciation_pct,
            AssumptionField::CapexPct => &mut base.capex_pct,
        };
        *slot = value;
    }

    Ok(base)
}

fn read_drivers(reader: &mut SectionReader<'_>, horizon: u32) -> Result<ProjectionDrivers, LoadError> {
    let years = horizon as usize;
    let first_year_col = DRIVERS_BASE_YEAR_COL + 1;

    let streams = REVENUE_STREAMS
        .iter()
        .map(|rows| {
            Ok::<_, LoadError>(RevenueStream {
                name: rows.name.to_string(),
                base_level: reader.read(rows.base_level_row, DRIVERS_BASE_YEAR_COL, false)?,
                growth_rates: reader.read_row(rows.growth_row, first_year_col, years, true)?,
                cost_ratios: reader.read_row(rows.cost_ratio_row, first_year_col, years, true)?,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let variable_expense_ratios: Vec<Rate> =
        reader.read_row(VARIABLE_EXPENSE_ROW, first_year_col, years, true)?;

    Ok(ProjectionDrivers {
        streams,
        variable_expense_ratios,
    })
}

fn read_impact(reader: &mut SectionReader<'_>, horizon: u32) -> Result<ProjectImpact, LoadError> {
    let years = horizon as usize;
    if years > IMPACT_YEAR_COLS {
        return Err(LoadError::malformed(
            IMPACT_SHEET,
            format!("horizon of {years} years exceeds the {IMPACT_YEAR_COLS} forecast-year columns D..H"),
        ));
    }

    let mut impact = ProjectImpact::default();
    for entry in &IMPACT_ROWS {
        let values = reader.read_row(entry.row, 0, years, false)?;
        match entry.field {
            ImpactField::Capex => impact.capex = values,
            ImpactField::AdditionalRevenue => impact.additional_revenue = values,
            ImpactField::OpexSavings => impact.opex_savings = values,
            ImpactField::AdditionalDepreciation => impact.additional_depreciation = values,
        }
    }
    Ok(impact)
}
