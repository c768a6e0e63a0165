use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ComputationError;
use crate::time_value::Checked;
use crate::types::{Money, Multiple, Rate};

use super::projection::YearProjection;

/// Enterprise value from a completed projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Sum of discounted explicit-period free cash flows
    pub pv_projected_fcf: Money,
    /// Final-year FCF grown one year at the perpetuity rate
    pub terminal_fcf: Money,
    /// Gordon growth terminal value, undiscounted
    pub terminal_value: Money,
    /// Terminal value discounted with the final year's factor
    pub pv_terminal_value: Money,
    /// pv_projected_fcf + pv_terminal_value
    pub enterprise_value: Money,
    /// Share of enterprise value coming from the terminal value
    pub terminal_value_pct: Rate,
    /// EV over final-year total revenue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_to_revenue: Option<Multiple>,
    /// EV over final-year EBITDA (EBIT + D&A)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_to_ebitda: Option<Multiple>,
    pub wacc: Rate,
    pub growth: Rate,
}

/// Headline figures handed to UI front-ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub enterprise_value: Money,
    pub pv_projected_fcf: Money,
    pub pv_terminal_value: Money,
    pub wacc: Rate,
    pub growth: Rate,
    pub tax_rate: Rate,
}

impl ValuationSummary {
    pub fn new(result: &ValuationResult, tax_rate: Rate) -> Self {
        ValuationSummary {
            enterprise_value: result.enterprise_value,
            pv_projected_fcf: result.pv_projected_fcf,
            pv_terminal_value: result.pv_terminal_value,
            wacc: result.wacc,
            growth: result.growth,
            tax_rate,
        }
    }
}

/// Apply the Gordon growth terminal value to the final projected year and
/// add it to the present value of the explicit flows.
///
/// `wacc` must exceed `growth`; otherwise the perpetuity does not converge
/// and no value is computed.
pub fn value(
    projection: &[YearProjection],
    wacc: Rate,
    growth: Rate,
) -> Result<ValuationResult, ComputationError> {
    if wacc <= growth {
        return Err(ComputationError::NonConvergentTerminalValue { wacc, growth });
    }
    let last = projection
        .last()
        .ok_or_else(|| ComputationError::missing("projection", None))?;

    let calc = Checked::terminal();
    let terminal_fcf = calc.mul(
        "terminal_fcf",
        last.fcf,
        calc.add("terminal_fcf", Decimal::ONE, growth)?,
    )?;
    let terminal_value = calc.div(
        "terminal_value",
        terminal_fcf,
        calc.sub("terminal_value", wacc, growth)?,
    )?;
    let pv_terminal_value = calc.mul("pv_terminal_value", terminal_value, last.discount_factor)?;

    let pv_projected_fcf = calc.sum("pv_projected_fcf", projection.iter().map(|y| y.discounted_fcf))?;
    let enterprise_value = calc.add("enterprise_value", pv_projected_fcf, pv_terminal_value)?;

    let terminal_value_pct = ratio(pv_terminal_value, enterprise_value).unwrap_or(Decimal::ZERO);

    Ok(ValuationResult {
        pv_projected_fcf,
        terminal_fcf,
        terminal_value,
        pv_terminal_value,
        enterprise_value,
        terminal_value_pct,
        ev_to_revenue: ratio(enterprise_value, last.total_revenue),
        ev_to_ebitda: last.ebitda().and_then(|ebitda| ratio(enterprise_value, ebitda)),
        wacc,
        growth,
    })
}

/// Review notes for a completed valuation.
pub fn valuation_warnings(result: &ValuationResult) -> Vec<String> {
    let mut warnings = Vec::new();
    if result.terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            result.terminal_value_pct * dec!(100)
        ));
    }
    if result.terminal_fcf < Decimal::ZERO {
        warnings.push("Final-year free cash flow is negative; terminal value is negative".into());
    }
    warnings
}

/// `None` for a zero denominator or a quotient outside the decimal range.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}
