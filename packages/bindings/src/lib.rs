use std::str::FromStr;

use napi::bindgen_prelude::Buffer;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use dcf_model_core::scenarios::sensitivity::SensitivityInput;
use dcf_model_core::{DcfModel, ModelConfig, ParameterBundle, Sensitivity};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_pct(name: &str, raw: &str) -> NapiResult<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| to_napi_error(format!("{name}: '{raw}' is not a number ({e})")))
}

// ---------------------------------------------------------------------------
// Stateless
// ---------------------------------------------------------------------------

/// Full run over a JSON parameter bundle; returns the output envelope.
#[napi]
pub fn run_dcf_model(bundle_json: String) -> NapiResult<String> {
    let bundle: ParameterBundle = serde_json::from_str(&bundle_json).map_err(to_napi_error)?;
    let mut model = DcfModel::default();
    model.load_bundle(bundle).map_err(to_napi_error)?;
    serde_json::to_string(&model.output()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One model instance owned by the JS caller. Results are returned as JSON
/// strings; accessors return `null` until a load has completed a run.
#[napi]
pub struct DcfSession {
    model: DcfModel,
}

#[napi]
impl DcfSession {
    #[napi(constructor)]
    pub fn new(horizon_years: Option<u32>, base_year: Option<i32>) -> Self {
        let defaults = ModelConfig::default();
        let config = ModelConfig {
            horizon_years: horizon_years.unwrap_or(defaults.horizon_years),
            base_year: base_year.unwrap_or(defaults.base_year),
        };
        DcfSession {
            model: DcfModel::new(config),
        }
    }

    #[napi]
    pub fn load_workbook(&mut self, path: String) -> NapiResult<String> {
        let status = self.model.load_path(&path).map_err(to_napi_error)?;
        serde_json::to_string(&status).map_err(to_napi_error)
    }

    /// Load from an uploaded file's bytes.
    #[napi]
    pub fn load_workbook_bytes(&mut self, bytes: Buffer) -> NapiResult<String> {
        let status = self.model.load_bytes(bytes.to_vec()).map_err(to_napi_error)?;
        serde_json::to_string(&status).map_err(to_napi_error)
    }

    #[napi]
    pub fn load_bundle(&mut self, bundle_json: String) -> NapiResult<String> {
        let bundle: ParameterBundle = serde_json::from_str(&bundle_json).map_err(to_napi_error)?;
        let status = self.model.load_bundle(bundle).map_err(to_napi_error)?;
        serde_json::to_string(&status).map_err(to_napi_error)
    }

    /// Rates in percent as decimal strings (e.g. "12.5").
    #[napi]
    pub fn set_sensitivity(
        &mut self,
        wacc_pct: String,
        growth_pct: String,
        tax_rate_pct: String,
    ) -> NapiResult<String> {
        let sensitivity = Sensitivity {
            wacc_pct: parse_pct("wacc", &wacc_pct)?,
            growth_pct: parse_pct("growth", &growth_pct)?,
            tax_rate_pct: parse_pct("tax_rate", &tax_rate_pct)?,
        };
        let status = self
            .model
            .set_sensitivity(sensitivity)
            .map_err(to_napi_error)?;
        serde_json::to_string(&status).map_err(to_napi_error)
    }

    #[napi]
    pub fn status(&self) -> NapiResult<String> {
        serde_json::to_string(self.model.status()).map_err(to_napi_error)
    }

    #[napi]
    pub fn get_parameters(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.parameters()).map_err(to_napi_error)
    }

    #[napi]
    pub fn get_warnings(&self) -> NapiResult<String> {
        serde_json::to_string(self.model.warnings()).map_err(to_napi_error)
    }

    #[napi]
    pub fn get_projection(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.projection()).map_err(to_napi_error)
    }

    #[napi]
    pub fn get_valuation_summary(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.valuation_summary()).map_err(to_napi_error)
    }

    #[napi]
    pub fn get_project_analysis(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.project_analysis()).map_err(to_napi_error)
    }

    #[napi]
    pub fn export_tables(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.export_tables()).map_err(to_napi_error)
    }

    /// Full results of the last run in the standard output envelope.
    #[napi]
    pub fn output(&self) -> NapiResult<String> {
        serde_json::to_string(&self.model.output()).map_err(to_napi_error)
    }

    #[napi]
    pub fn sensitivity_grid(&self, input_json: String) -> NapiResult<String> {
        let input: SensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
        let output = self.model.sensitivity_grid(&input).map_err(to_napi_error)?;
        serde_json::to_string(&output).map_err(to_napi_error)
    }
}
