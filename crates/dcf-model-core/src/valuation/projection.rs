use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ComputationError;
use crate::loader::schema::{DAYS_PER_YEAR, FIXED_COST_INFLATION};
use crate::params::{BaseAssumptions, ModelConfig, ParameterBundle};
use crate::time_value::{compound_factor, discount_factor, Checked};
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One explicitly projected year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    /// Fiscal year label
    pub year: i32,
    /// Forecast year index, 1-based
    pub period: u32,
    /// Revenue of each stream, in driver order
    pub stream_revenues: Vec<Money>,
    /// Sum of the stream revenues, before project revenue
    pub base_revenue: Money,
    /// Base revenue plus additional project revenue
    pub total_revenue: Money,
    pub cost_of_sales: Money,
    pub fixed_opex: Money,
    pub variable_opex: Money,
    pub ebit: Money,
    /// Depreciation & amortisation, base plus projects
    pub depreciation: Money,
    pub nopat: Money,
    /// Working capital level at year end
    pub working_capital: Money,
    /// Change in working capital over the prior year
    pub working_capital_change: Money,
    /// Capital expenditure, base plus projects
    pub capex: Money,
    pub fcf: Money,
    pub discount_factor: Rate,
    pub discounted_fcf: Money,
}

impl YearProjection {
    /// EBIT + D&A; `None` outside the decimal range.
    pub fn ebitda(&self) -> Option<Money> {
        self.ebit.checked_add(self.depreciation)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project free cash flow over the configured horizon and discount it at
/// the bundle's WACC.
///
/// Years are strictly sequential: stream revenue compounds from the prior
/// year's level (base year for `t = 1`) and the working-capital change is
/// measured against the prior year's level (zero for `t = 1`).
pub fn project(
    params: &ParameterBundle,
    config: &ModelConfig,
) -> Result<Vec<YearProjection>, ComputationError> {
    validate_params(params, config.horizon_years)?;

    let base = &params.base;
    let drivers = &params.drivers;
    let impact = &params.impact;

    let mut projections = Vec::with_capacity(config.horizon_years as usize);
    let mut prev_levels: Vec<Money> = drivers.streams.iter().map(|s| s.base_level).collect();
    let mut prev_working_capital = Decimal::ZERO;

    for period in 1..=config.horizon_years {
        let idx = (period - 1) as usize;
        let calc = Checked::year(period);

        // --- Revenue streams and cost of sales ---
        let mut stream_revenues = Vec::with_capacity(drivers.streams.len());
        let mut cost_of_sales = Decimal::ZERO;
        for (stream, prev) in drivers.streams.iter().zip(&prev_levels) {
            let growth = calc.add("stream_revenue", Decimal::ONE, stream.growth_rates[idx])?;
            let level = calc.mul("stream_revenue", *prev, growth)?;
            let cost = calc.mul("cost_of_sales", level, stream.cost_ratios[idx])?;
            cost_of_sales = calc.add("cost_of_sales", cost_of_sales, cost)?;
            stream_revenues.push(level);
        }
        let base_revenue = calc.sum("base_revenue", stream_revenues.iter().copied())?;
        let total_revenue =
            calc.add("total_revenue", base_revenue, impact.additional_revenue[idx])?;

        // --- Operating expenses and EBIT ---
        let fixed_opex = calc.mul(
            "fixed_opex",
            base.base_fixed_opex,
            compound_factor(FIXED_COST_INFLATION, period)?,
        )?;
        let variable_opex =
            calc.mul("variable_opex", base_revenue, drivers.variable_expense_ratios[idx])?;
        let costs = calc.sum("ebit", [cost_of_sales, fixed_opex, variable_opex])?;
        let ebit = calc.add(
            "ebit",
            calc.sub("ebit", total_revenue, costs)?,
            impact.opex_savings[idx],
        )?;

        let depreciation = calc.add(
            "depreciation",
            calc.mul("depreciation", base_revenue, base.depreciation_pct)?,
            impact.additional_depreciation[idx],
        )?;
        let nopat = calc.mul("nopat", ebit, calc.sub("nopat", Decimal::ONE, base.tax_rate)?)?;

        // --- Working capital ---
        let working_capital = working_capital_level(calc, base, total_revenue, cost_of_sales)?;
        let working_capital_change =
            calc.sub("working_capital_change", working_capital, prev_working_capital)?;

        let capex = calc.add(
            "capex",
            calc.mul("capex", base_revenue, base.capex_pct)?,
            impact.capex[idx],
        )?;

        // FCF = NOPAT + D&A - Delta WC - CapEx
        let outflows = calc.add("fcf", working_capital_change, capex)?;
        let fcf = calc.sub("fcf", calc.add("fcf", nopat, depreciation)?, outflows)?;

        let discount_factor = discount_factor(base.wacc, period)?;
        let discounted_fcf = calc.mul("discounted_fcf", fcf, discount_factor)?;

        projections.push(YearProjection {
            year: config.base_year + period as i32,
            period,
            stream_revenues: stream_revenues.clone(),
            base_revenue,
            total_revenue,
            cost_of_sales,
            fixed_opex,
            variable_opex,
            ebit,
            depreciation,
            nopat,
            working_capital,
            working_capital_change,
            capex,
            fcf,
            discount_factor,
            discounted_fcf,
        });

        prev_levels = stream_revenues;
        prev_working_capital = working_capital;
    }

    debug!(years = projections.len(), wacc = %base.wacc, "projection complete");
    Ok(projections)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Receivables on total revenue, inventory less payables on cost of sales.
fn working_capital_level(
    calc: Checked,
    base: &BaseAssumptions,
    total_revenue: Money,
    cost_of_sales: Money,
) -> Result<Money, ComputationError> {
    let field = "working_capital";
    let receivables = calc.mul(field, base.receivable_days / DAYS_PER_YEAR, total_revenue)?;
    let inventory = calc.mul(field, base.inventory_days / DAYS_PER_YEAR, cost_of_sales)?;
    let payables = calc.mul(field, base.payable_days / DAYS_PER_YEAR, cost_of_sales)?;
    calc.sub(field, calc.add(field, receivables, inventory)?, payables)
}

fn validate_params(params: &ParameterBundle, horizon: u32) -> Result<(), ComputationError> {
    if horizon == 0 {
        return Err(ComputationError::missing("forecast horizon", None));
    }
    if params.base.wacc <= -Decimal::ONE {
        return Err(ComputationError::InvalidRate {
            field: "wacc".into(),
            value: params.base.wacc,
            reason: "WACC must be greater than -100%".into(),
        });
    }
    if params.drivers.streams.is_empty() {
        return Err(ComputationError::missing("revenue streams", None));
    }

    let mut series: Vec<(String, usize)> = Vec::new();
    for stream in &params.drivers.streams {
        series.push((format!("growth_rates[{}]", stream.name), stream.growth_rates.len()));
        series.push((format!("cost_ratios[{}]", stream.name), stream.cost_ratios.len()));
    }
    series.push((
        "variable_expense_ratios".into(),
        params.drivers.variable_expense_ratios.len(),
    ));
    let impact = &params.impact;
    series.push(("impact.capex".into(), impact.capex.len()));
    series.push(("impact.additional_revenue".into(), impact.additional_revenue.len()));
    series.push(("impact.opex_savings".into(), impact.opex_savings.len()));
    series.push((
        "impact.additional_depreciation".into(),
        impact.additional_depreciation.len(),
    ));

    for (parameter, len) in series {
        if len < horizon as usize {
            return Err(ComputationError::MissingInput {
                parameter,
                year: Some(len as u32 + 1),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
