use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dcf_model_core::scenarios::sensitivity::{SensitivityInput, SweepRange};

use super::model::{run_model, ModelArgs};

/// Arguments for the WACC x growth sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// WACC sweep as min:max:step in decimals (e.g. "0.14:0.26:0.02").
    /// Defaults to the active WACC +/- 4 points in 1-point steps.
    #[arg(long)]
    pub wacc_range: Option<String>,

    /// Perpetuity growth sweep as min:max:step in decimals.
    /// Defaults to the active growth +/- 2 points in half-point steps.
    #[arg(long)]
    pub growth_range: Option<String>,
}

fn parse_sweep(raw: &str) -> Result<SweepRange, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Sweep must be min:max:step, got '{}'", raw).into());
    }
    Ok(SweepRange {
        min: parts[0].trim().parse()?,
        max: parts[1].trim().parse()?,
        step: parts[2].trim().parse()?,
    })
}

fn centered(rate: Decimal, half_width: Decimal, step: Decimal) -> SweepRange {
    SweepRange {
        min: rate - half_width,
        max: rate + half_width,
        step,
    }
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = run_model(&args.model)?;
    let base = &model
        .parameters()
        .ok_or("model has no parameters")?
        .base;

    let wacc = match args.wacc_range {
        Some(ref raw) => parse_sweep(raw)?,
        None => centered(base.wacc, Decimal::new(4, 2), Decimal::new(1, 2)),
    };
    let growth = match args.growth_range {
        Some(ref raw) => parse_sweep(raw)?,
        None => centered(base.perpetuity_growth, Decimal::new(2, 2), Decimal::new(5, 3)),
    };

    let output = model.sensitivity_grid(&SensitivityInput { wacc, growth })?;
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sweep() {
        let range = parse_sweep("0.08:0.12:0.01").unwrap();
        assert_eq!(range.min, Decimal::new(8, 2));
        assert_eq!(range.max, Decimal::new(12, 2));
        assert_eq!(range.step, Decimal::new(1, 2));
    }

    #[test]
    fn test_parse_sweep_rejects_wrong_arity() {
        assert!(parse_sweep("0.08:0.12").is_err());
        assert!(parse_sweep("a:b:c").is_err());
    }

    #[test]
    fn test_centered_range() {
        let range = centered(Decimal::new(20, 2), Decimal::new(4, 2), Decimal::new(1, 2));
        assert_eq!(range.min, Decimal::new(16, 2));
        assert_eq!(range.max, Decimal::new(24, 2));
    }
}
