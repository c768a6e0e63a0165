use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ComputationError;
use crate::time_value::{discount_factor, Checked};
use crate::types::*;
use crate::valuation::{value, YearProjection};

const MAX_SWEEP_POINTS: usize = 200;

/// Inclusive sweep of one rate, expressed as decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRange {
    pub min: Rate,
    pub max: Rate,
    pub step: Rate,
}

/// Input for the WACC x perpetuity-growth sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub wacc: SweepRange,
    pub growth: SweepRange,
}

/// Output of the 2-way sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub wacc_values: Vec<Rate>,
    pub growth_values: Vec<Rate>,
    /// matrix[i][j] = enterprise value at wacc_values[i], growth_values[j];
    /// `None` where growth is not below WACC
    pub matrix: Vec<Vec<Option<Money>>>,
    /// Enterprise value at the grid point closest to the active rates
    pub base_case_value: Option<Money>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values from min to max with step.
fn generate_sweep_values(name: &str, range: &SweepRange) -> Result<Vec<Rate>, ComputationError> {
    let invalid = |reason: &str| ComputationError::InvalidRate {
        field: format!("{name}.step"),
        value: range.step,
        reason: reason.into(),
    };
    if range.step <= Decimal::ZERO {
        return Err(invalid("Step must be positive"));
    }
    if range.min > range.max {
        return Err(invalid("Min must be <= max"));
    }
    if (range.max - range.min) / range.step > Decimal::from(MAX_SWEEP_POINTS) {
        return Err(invalid("Sweep has too many points"));
    }

    let mut values = Vec::new();
    let mut current = range.min;
    while current <= range.max {
        values.push(current);
        current += range.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < range.max {
            values.push(range.max);
        }
    }
    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Re-discount the same undiscounted free cash flows at another WACC.
fn rediscount(projection: &[YearProjection], wacc: Rate) -> Result<Vec<YearProjection>, ComputationError> {
    projection
        .iter()
        .map(|year| {
            let factor = discount_factor(wacc, year.period)?;
            let discounted_fcf = Checked::year(year.period).mul("discounted_fcf", year.fcf, factor)?;
            Ok::<_, ComputationError>(YearProjection {
                discount_factor: factor,
                discounted_fcf,
                ..year.clone()
            })
        })
        .collect()
}

/// Enterprise value over a WACC x growth grid.
///
/// Tax rate and operating drivers stay fixed, so every cell reuses the
/// projection's undiscounted free cash flows.
pub fn evaluate_sensitivity(
    projection: &[YearProjection],
    input: &SensitivityInput,
    active_wacc: Rate,
    active_growth: Rate,
) -> Result<ComputationOutput<SensitivityOutput>, ComputationError> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let wacc_values = generate_sweep_values("wacc", &input.wacc)?;
    let growth_values = generate_sweep_values("growth", &input.growth)?;

    let mut matrix = Vec::with_capacity(wacc_values.len());
    for wacc in &wacc_values {
        let rediscounted = rediscount(projection, *wacc)?;
        let mut row = Vec::with_capacity(growth_values.len());
        for growth in &growth_values {
            match value(&rediscounted, *wacc, *growth) {
                Ok(result) => row.push(Some(result.enterprise_value)),
                Err(ComputationError::NonConvergentTerminalValue { .. }) => row.push(None),
                Err(e) => return Err(e),
            }
        }
        matrix.push(row);
    }

    let skipped = matrix.iter().flatten().filter(|v| v.is_none()).count();
    if skipped > 0 {
        warnings.push(format!(
            "{skipped} grid points skipped where growth is not below WACC"
        ));
    }

    let base_row = closest_index(&wacc_values, active_wacc);
    let base_col = closest_index(&growth_values, active_growth);
    let base_case_value = matrix
        .get(base_row)
        .and_then(|row| row.get(base_col))
        .copied()
        .flatten();

    let output = SensitivityOutput {
        wacc_values,
        growth_values,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    Ok(with_metadata(
        "2-Way Sensitivity: Enterprise Value by WACC and Perpetuity Growth",
        input,
        warnings,
        elapsed_us(start),
        output,
    ))
}
