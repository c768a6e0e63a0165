use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::loader::schema::{BASE_YEAR, FORECAST_YEARS};
use crate::types::{Days, Money, Rate};

/// Horizon settings of a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of explicitly projected years
    pub horizon_years: u32,
    /// Fiscal year of the base-year column; forecast year `t` is `base_year + t`
    pub base_year: i32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            horizon_years: FORECAST_YEARS,
            base_year: BASE_YEAR,
        }
    }
}

/// Scalar parameters of the base-assumptions sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseAssumptions {
    /// Total revenue of the base year
    pub base_revenue: Money,
    /// Fixed operating expenses of the base year
    pub base_fixed_opex: Money,
    /// Days sales outstanding
    pub receivable_days: Days,
    /// Days inventory outstanding
    pub inventory_days: Days,
    /// Days payables outstanding
    pub payable_days: Days,
    /// Discount rate
    pub wacc: Rate,
    /// Perpetuity growth rate for the Gordon terminal value
    pub perpetuity_growth: Rate,
    /// Effective tax rate on operating profit
    pub tax_rate: Rate,
    /// Base depreciation & amortisation as a share of base revenue
    pub depreciation_pct: Rate,
    /// Base capital expenditure as a share of base revenue
    pub capex_pct: Rate,
}

/// Per-year drivers of one revenue stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueStream {
    pub name: String,
    /// Revenue of the stream in the base year
    pub base_level: Money,
    /// Growth over the prior year, one entry per forecast year
    pub growth_rates: Vec<Rate>,
    /// Cost of sales as a share of the stream's revenue, per forecast year
    pub cost_ratios: Vec<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDrivers {
    /// Two "binomial" streams followed by the general stream
    pub streams: Vec<RevenueStream>,
    /// Variable operating expenses as a share of base revenue, per forecast year
    pub variable_expense_ratios: Vec<Rate>,
}

/// Incremental effects of discrete projects, one entry per forecast year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectImpact {
    pub capex: Vec<Money>,
    pub additional_revenue: Vec<Money>,
    pub opex_savings: Vec<Money>,
    pub additional_depreciation: Vec<Money>,
}

impl ProjectImpact {
    /// No project effects over `years` forecast years.
    pub fn none(years: u32) -> Self {
        let zeros = vec![Decimal::ZERO; years as usize];
        ProjectImpact {
            capex: zeros.clone(),
            additional_revenue: zeros.clone(),
            opex_savings: zeros.clone(),
            additional_depreciation: zeros,
        }
    }
}

/// Everything the projection needs, as read from one workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBundle {
    pub base: BaseAssumptions,
    pub drivers: ProjectionDrivers,
    pub impact: ProjectImpact,
}

/// Sensitivity overrides as entered in a UI, in percent (12.5 = 12.5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    pub wacc_pct: Decimal,
    pub growth_pct: Decimal,
    pub tax_rate_pct: Decimal,
}

impl Sensitivity {
    /// Current rates of a bundle expressed in percent.
    pub fn from_base(base: &BaseAssumptions) -> Self {
        Sensitivity {
            wacc_pct: base.wacc * dec!(100),
            growth_pct: base.perpetuity_growth * dec!(100),
            tax_rate_pct: base.tax_rate * dec!(100),
        }
    }

    /// Overwrite WACC, perpetuity growth and tax rate.
    pub fn apply_to(&self, base: &mut BaseAssumptions) {
        base.wacc = self.wacc_pct / dec!(100);
        base.perpetuity_growth = self.growth_pct / dec!(100);
        base.tax_rate = self.tax_rate_pct / dec!(100);
    }
}
