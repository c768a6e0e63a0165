use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use dcf_model_core::loader::schema::{BASE_YEAR, FORECAST_YEARS};
use dcf_model_core::{
    elapsed_us, with_metadata, CellWarning, ComputationError, DcfModel, DcfModelError,
    ModelConfig, ModelStatus, ParameterBundle, Sensitivity,
};

use crate::input;

/// Arguments shared by every command that loads the model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ModelArgs {
    /// Path to the workbook (xlsx, xlsm, xlsb, xls or ods)
    #[arg(long, conflicts_with = "input")]
    pub workbook: Option<String>,

    /// Path to a JSON parameter bundle instead of a workbook
    #[arg(long)]
    pub input: Option<String>,

    /// Number of explicitly projected years
    #[arg(long, default_value_t = FORECAST_YEARS)]
    pub horizon: u32,

    /// Fiscal year of the base-year column
    #[arg(long, default_value_t = BASE_YEAR)]
    pub base_year: i32,

    /// WACC override in percent (e.g. 12.5 for 12.5%)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Perpetuity growth override in percent
    #[arg(long)]
    pub growth: Option<Decimal>,

    /// Tax rate override in percent
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Fail on unparseable cells instead of reading them as zero
    #[arg(long)]
    pub strict: bool,
}

impl ModelArgs {
    fn has_overrides(&self) -> bool {
        self.wacc.is_some() || self.growth.is_some() || self.tax_rate.is_some()
    }

    fn describe(&self) -> Value {
        json!({
            "workbook": self.workbook,
            "input": self.input,
            "horizon_years": self.horizon,
            "base_year": self.base_year,
            "wacc_pct": self.wacc.map(|v| v.to_string()),
            "growth_pct": self.growth.map(|v| v.to_string()),
            "tax_rate_pct": self.tax_rate.map(|v| v.to_string()),
            "strict": self.strict,
        })
    }
}

/// Load parameters and apply any rate overrides.
///
/// A valuation failure is handed back next to the model instead of aborting,
/// so `load` can still report the parameters it read.
fn load_model(
    args: &ModelArgs,
) -> Result<(DcfModel, Option<ComputationError>), Box<dyn std::error::Error>> {
    let config = ModelConfig {
        horizon_years: args.horizon,
        base_year: args.base_year,
    };
    let mut model = DcfModel::new(config).with_strict_cells(args.strict);

    let loaded = if let Some(ref path) = args.workbook {
        let path = input::file::workbook_path(path)?;
        info!(path = %path.display(), "loading workbook");
        model.load_path(&path)
    } else if let Some(ref path) = args.input {
        model.load_bundle(input::file::read_bundle(path)?)
    } else if let Some(bundle) = input::stdin::read_stdin_bundle()? {
        model.load_bundle(bundle)
    } else {
        return Err(
            "--workbook or --input is required (or pipe a JSON parameter bundle on stdin)".into(),
        );
    };

    let mut pending = match loaded {
        Ok(_) => None,
        Err(DcfModelError::Computation(e)) => Some(e),
        Err(e) => return Err(e.into()),
    };

    if args.has_overrides() {
        if let Some(params) = model.parameters() {
            let mut sensitivity = Sensitivity::from_base(&params.base);
            if let Some(w) = args.wacc {
                sensitivity.wacc_pct = w;
            }
            if let Some(g) = args.growth {
                sensitivity.growth_pct = g;
            }
            if let Some(t) = args.tax_rate {
                sensitivity.tax_rate_pct = t;
            }
            debug!(?sensitivity, "applying rate overrides");
            pending = model.set_sensitivity(sensitivity).err();
        }
    }

    Ok((model, pending))
}

/// Load and require a completed valuation.
pub fn run_model(args: &ModelArgs) -> Result<DcfModel, Box<dyn std::error::Error>> {
    let (model, pending) = load_model(args)?;
    match pending {
        Some(e) => Err(e.into()),
        None => Ok(model),
    }
}

#[derive(Serialize)]
struct LoadReport<'a> {
    status: &'a ModelStatus,
    parameters: Option<&'a ParameterBundle>,
    cell_warnings: &'a [CellWarning],
}

pub fn run_load(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let (model, pending) = load_model(&args)?;

    let mut warnings: Vec<String> = model.warnings().iter().map(|w| w.to_string()).collect();
    if let Some(e) = pending {
        warnings.push(format!("Valuation not computed: {e}"));
    }

    let report = LoadReport {
        status: model.status(),
        parameters: model.parameters(),
        cell_warnings: model.warnings(),
    };
    let output = with_metadata(
        "Fixed-schema workbook load",
        &args.describe(),
        warnings,
        elapsed_us(start),
        report,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_full(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = run_model(&args)?;
    let output = model.output().ok_or("model produced no results")?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_projection(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = run_model(&args)?;
    let projection = model.projection().ok_or("model produced no projection")?;
    Ok(serde_json::to_value(projection)?)
}

pub fn run_summary(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = run_model(&args)?;
    let full = model.output().ok_or("model produced no results")?;
    let mut output = full.map_result(|run| run.summary);
    output.assumptions = args.describe();
    Ok(serde_json::to_value(output)?)
}

pub fn run_export(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = run_model(&args)?;
    let tables = model.export_tables().ok_or("model produced no results")?;
    Ok(json!({ "tables": tables }))
}
