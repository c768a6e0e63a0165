//! Owned model state: one loaded parameter bundle plus the results of its
//! last full run.
//!
//! Every run recomputes projection and valuation from the parameters and
//! swaps them in together, so readers never see a projection from one run
//! next to a valuation from another.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "xlsx")]
use std::path::Path;

use crate::error::{ComputationError, DcfModelError, LoadError};
use crate::loader::{self, CellWarning, LoadOptions, LoadedBundle};
use crate::params::{ModelConfig, ParameterBundle, Sensitivity};
use crate::report::{
    project_analysis_table, project_impact_rows, projection_table, summary_table, LabeledTable,
    ProjectImpactRow,
};
use crate::scenarios::sensitivity::{evaluate_sensitivity, SensitivityInput, SensitivityOutput};
use crate::types::{elapsed_us, with_metadata, ComputationOutput};
use crate::valuation::{
    project, valuation_warnings, value, ValuationResult, ValuationSummary, YearProjection,
};
use crate::workbook::Workbook;

/// Load state of a model instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ModelStatus {
    NotLoaded,
    Ready,
    /// Last load attempt failed; carries the error message
    Failed(String),
}

/// Outcome of a run request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Nothing is loaded; the request was ignored
    NotReady,
}

/// Everything a full run produces, as handed to front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRun {
    pub summary: ValuationSummary,
    pub valuation: ValuationResult,
    pub projection: Vec<YearProjection>,
    pub project_analysis: Vec<ProjectImpactRow>,
}

#[derive(Debug, Clone)]
struct RunState {
    projection: Vec<YearProjection>,
    valuation: ValuationResult,
    elapsed_us: u64,
}

#[derive(Debug, Clone)]
pub struct DcfModel {
    config: ModelConfig,
    strict_cells: bool,
    status: ModelStatus,
    params: Option<ParameterBundle>,
    cell_warnings: Vec<CellWarning>,
    run: Option<RunState>,
}

impl Default for DcfModel {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl DcfModel {
    pub fn new(config: ModelConfig) -> Self {
        DcfModel {
            config,
            strict_cells: false,
            status: ModelStatus::NotLoaded,
            params: None,
            cell_warnings: Vec::new(),
            run: None,
        }
    }

    /// Reject unparseable cells at load time instead of reading them as zero.
    pub fn with_strict_cells(mut self, strict: bool) -> Self {
        self.strict_cells = strict;
        self
    }

    /// Load parameters from an in-memory workbook and run the model.
    ///
    /// A load failure discards any previously loaded state. A computation
    /// failure keeps the loaded parameters, so a later
    /// [`set_sensitivity`](Self::set_sensitivity) can recover.
    pub fn load(&mut self, workbook: &Workbook) -> Result<RunStatus, DcfModelError> {
        let options = LoadOptions {
            horizon_years: self.config.horizon_years,
            strict: self.strict_cells,
        };
        let loaded = loader::load_with(workbook, &options);
        self.accept_load(loaded)
    }

    #[cfg(feature = "xlsx")]
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<RunStatus, DcfModelError> {
        match Workbook::open(path) {
            Ok(workbook) => self.load(&workbook),
            Err(e) => self.accept_load(Err(e.into_schema_error())),
        }
    }

    #[cfg(feature = "xlsx")]
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> Result<RunStatus, DcfModelError> {
        match Workbook::from_bytes(bytes) {
            Ok(workbook) => self.load(&workbook),
            Err(e) => self.accept_load(Err(e.into_schema_error())),
        }
    }

    /// Use an already-assembled parameter bundle, e.g. deserialized from JSON.
    pub fn load_bundle(&mut self, params: ParameterBundle) -> Result<RunStatus, DcfModelError> {
        self.accept_load(Ok(LoadedBundle {
            params,
            warnings: Vec::new(),
        }))
    }

    fn accept_load(
        &mut self,
        loaded: Result<LoadedBundle, LoadError>,
    ) -> Result<RunStatus, DcfModelError> {
        self.run = None;
        match loaded {
            Ok(LoadedBundle { params, warnings }) => {
                info!(cell_warnings = warnings.len(), "parameters loaded");
                self.params = Some(params);
                self.cell_warnings = warnings;
                self.status = ModelStatus::Ready;
                Ok(self.run()?)
            }
            Err(e) => {
                warn!(error = %e, "load failed");
                self.params = None;
                self.cell_warnings.clear();
                self.status = ModelStatus::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Recompute projection and valuation from the loaded parameters.
    ///
    /// Before a successful load this is a no-op reporting `NotReady`. On
    /// failure the previous results are kept.
    pub fn run(&mut self) -> Result<RunStatus, ComputationError> {
        let Some(params) = self.params.as_ref() else {
            warn!(status = ?self.status, "run requested before a successful load");
            return Ok(RunStatus::NotReady);
        };
        let state = compute(params, &self.config)?;
        self.run = Some(state);
        Ok(RunStatus::Completed)
    }

    /// Override WACC, perpetuity growth and tax rate (in percent) and re-run.
    ///
    /// Parameters and results are replaced only if the new run succeeds.
    pub fn set_sensitivity(
        &mut self,
        sensitivity: Sensitivity,
    ) -> Result<RunStatus, ComputationError> {
        let Some(current) = self.params.as_ref() else {
            return Ok(RunStatus::NotReady);
        };
        let mut params = current.clone();
        sensitivity.apply_to(&mut params.base);
        let state = compute(&params, &self.config)?;

        info!(
            wacc = %params.base.wacc,
            growth = %params.base.perpetuity_growth,
            tax_rate = %params.base.tax_rate,
            "sensitivity applied"
        );
        self.params = Some(params);
        self.run = Some(state);
        Ok(RunStatus::Completed)
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ModelStatus::Ready
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Active parameter set, including any sensitivity overrides.
    pub fn parameters(&self) -> Option<&ParameterBundle> {
        self.params.as_ref()
    }

    /// Cells read as zero during the last load.
    pub fn warnings(&self) -> &[CellWarning] {
        &self.cell_warnings
    }

    pub fn projection(&self) -> Option<&[YearProjection]> {
        self.run.as_ref().map(|r| r.projection.as_slice())
    }

    pub fn valuation(&self) -> Option<&ValuationResult> {
        self.run.as_ref().map(|r| &r.valuation)
    }

    pub fn valuation_summary(&self) -> Option<ValuationSummary> {
        let run = self.run.as_ref()?;
        let params = self.params.as_ref()?;
        Some(ValuationSummary::new(&run.valuation, params.base.tax_rate))
    }

    pub fn project_analysis(&self) -> Option<Vec<ProjectImpactRow>> {
        let run = self.run.as_ref()?;
        let params = self.params.as_ref()?;
        Some(project_impact_rows(&run.projection, &params.impact))
    }

    /// Summary, detailed projection and project-analysis tables.
    pub fn export_tables(&self) -> Option<Vec<LabeledTable>> {
        let run = self.run.as_ref()?;
        let params = self.params.as_ref()?;
        let summary = ValuationSummary::new(&run.valuation, params.base.tax_rate);
        let stream_names: Vec<String> =
            params.drivers.streams.iter().map(|s| s.name.clone()).collect();
        Some(vec![
            summary_table(&summary, &run.valuation),
            projection_table(&run.projection, &stream_names),
            project_analysis_table(&project_impact_rows(&run.projection, &params.impact)),
        ])
    }

    /// Full results of the last run in the standard output envelope.
    pub fn output(&self) -> Option<ComputationOutput<ModelRun>> {
        let run = self.run.as_ref()?;
        let params = self.params.as_ref()?;

        let mut warnings: Vec<String> =
            self.cell_warnings.iter().map(|w| w.to_string()).collect();
        warnings.extend(valuation_warnings(&run.valuation));

        let result = ModelRun {
            summary: ValuationSummary::new(&run.valuation, params.base.tax_rate),
            valuation: run.valuation.clone(),
            projection: run.projection.clone(),
            project_analysis: project_impact_rows(&run.projection, &params.impact),
        };
        Some(with_metadata(
            "Free Cash Flow DCF with Gordon Growth Terminal Value",
            params,
            warnings,
            run.elapsed_us,
            result,
        ))
    }

    /// Enterprise value over a WACC x growth grid around the active rates.
    pub fn sensitivity_grid(
        &self,
        input: &SensitivityInput,
    ) -> Result<ComputationOutput<SensitivityOutput>, ComputationError> {
        let (Some(run), Some(params)) = (self.run.as_ref(), self.params.as_ref()) else {
            return Err(ComputationError::missing("projection", None));
        };
        evaluate_sensitivity(
            &run.projection,
            input,
            params.base.wacc,
            params.base.perpetuity_growth,
        )
    }
}

fn compute(params: &ParameterBundle, config: &ModelConfig) -> Result<RunState, ComputationError> {
    let start = Instant::now();
    let projection = project(params, config)?;
    let valuation = value(&projection, params.base.wacc, params.base.perpetuity_growth)?;
    info!(
        years = projection.len(),
        enterprise_value = %valuation.enterprise_value,
        "model run completed"
    );
    Ok(RunState {
        projection,
        valuation,
        elapsed_us: elapsed_us(start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::params::{BaseAssumptions, ProjectImpact, ProjectionDrivers, RevenueStream};

    fn bundle() -> ParameterBundle {
        let stream = |name: &str, level| RevenueStream {
            name: name.into(),
            base_level: level,
            growth_rates: vec![dec!(0.05); 5],
            cost_ratios: vec![dec!(0.40); 5],
        };
        ParameterBundle {
            base: BaseAssumptions {
                base_revenue: dec!(2000000),
                base_fixed_opex: dec!(400000),
                receivable_days: dec!(45),
                inventory_days: dec!(30),
                payable_days: dec!(60),
                wacc: dec!(0.20),
                perpetuity_growth: dec!(0.03),
                tax_rate: dec!(0.30),
                depreciation_pct: dec!(0.05),
                capex_pct: dec!(0.06),
            },
            drivers: ProjectionDrivers {
                streams: vec![
                    stream("Binomio 1", dec!(800000)),
                    stream("Binomio 2", dec!(700000)),
                    stream("General", dec!(500000)),
                ],
                variable_expense_ratios: vec![dec!(0.10); 5],
            },
            impact: ProjectImpact::none(5),
        }
    }

    #[test]
    fn test_run_before_load_is_not_ready() {
        let mut model = DcfModel::default();
        assert_eq!(model.run().unwrap(), RunStatus::NotReady);
        assert_eq!(model.status(), &ModelStatus::NotLoaded);
        assert!(model.projection().is_none());
        assert!(model.valuation_summary().is_none());
    }

    #[test]
    fn test_set_sensitivity_before_load_is_not_ready() {
        let mut model = DcfModel::default();
        let s = Sensitivity {
            wacc_pct: dec!(12),
            growth_pct: dec!(2),
            tax_rate_pct: dec!(30),
        };
        assert_eq!(model.set_sensitivity(s).unwrap(), RunStatus::NotReady);
    }

    #[test]
    fn test_load_bundle_runs() {
        let mut model = DcfModel::default();
        assert_eq!(model.load_bundle(bundle()).unwrap(), RunStatus::Completed);
        assert!(model.is_ready());
        assert_eq!(model.projection().map(|p| p.len()), Some(5));
        let summary = model.valuation_summary().unwrap();
        assert_eq!(summary.wacc, dec!(0.20));
        assert_eq!(summary.tax_rate, dec!(0.30));
    }

    #[test]
    fn test_failed_sensitivity_keeps_previous_state() {
        let mut model = DcfModel::default();
        model.load_bundle(bundle()).unwrap();
        let before = model.valuation_summary().unwrap();

        let err = model
            .set_sensitivity(Sensitivity {
                wacc_pct: dec!(3),
                growth_pct: dec!(3),
                tax_rate_pct: dec!(30),
            })
            .unwrap_err();
        assert!(matches!(err, ComputationError::NonConvergentTerminalValue { .. }));
        assert_eq!(model.valuation_summary().unwrap(), before);
        assert_eq!(model.parameters().unwrap().base.wacc, dec!(0.20));
    }

    #[test]
    fn test_load_failure_discards_previous_state() {
        let mut model = DcfModel::default();
        model.load_bundle(bundle()).unwrap();
        let err = model.load(&Workbook::new()).unwrap_err();
        assert!(matches!(err, DcfModelError::Load(LoadError::MissingSchema { .. })));
        assert!(matches!(model.status(), ModelStatus::Failed(_)));
        assert!(model.parameters().is_none());
        assert_eq!(model.run().unwrap(), RunStatus::NotReady);
    }

    #[test]
    fn test_non_convergent_bundle_keeps_parameters() {
        let mut params = bundle();
        params.base.perpetuity_growth = dec!(0.25);
        let mut model = DcfModel::default();
        assert!(model.load_bundle(params).is_err());
        assert!(model.is_ready());
        assert!(model.projection().is_none());

        let status = model
            .set_sensitivity(Sensitivity {
                wacc_pct: dec!(20),
                growth_pct: dec!(3),
                tax_rate_pct: dec!(30),
            })
            .unwrap();
        assert_eq!(status, RunStatus::Completed);
        assert!(model.valuation().is_some());
    }

    #[test]
    fn test_output_envelope_carries_run() {
        let mut model = DcfModel::default();
        model.load_bundle(bundle()).unwrap();
        let out = model.output().unwrap();
        assert_eq!(out.result.projection.len(), 5);
        assert_eq!(out.result.project_analysis.len(), 5);
        assert_eq!(out.metadata.precision, "decimal128");
        assert_eq!(
            out.result.summary.enterprise_value,
            out.result.valuation.enterprise_value
        );
    }

    #[test]
    fn test_export_tables_order() {
        let mut model = DcfModel::default();
        model.load_bundle(bundle()).unwrap();
        let tables = model.export_tables().unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Sumario_Valuacion", "Proyecciones_Detalladas", "Analisis_Proyectos"]
        );
        assert_eq!(tables[1].rows.len(), 5);
    }

    #[test]
    fn test_sensitivity_grid_needs_a_run() {
        let model = DcfModel::default();
        let input = SensitivityInput {
            wacc: crate::scenarios::sensitivity::SweepRange {
                min: dec!(0.10),
                max: dec!(0.20),
                step: dec!(0.05),
            },
            growth: crate::scenarios::sensitivity::SweepRange {
                min: dec!(0.01),
                max: dec!(0.03),
                step: dec!(0.01),
            },
        };
        assert!(model.sensitivity_grid(&input).is_err());

        let mut model = DcfModel::default();
        model.load_bundle(bundle()).unwrap();
        let grid = model.sensitivity_grid(&input).unwrap();
        assert_eq!(grid.result.base_case_position, (2, 2));
        assert_eq!(
            grid.result.base_case_value,
            model.valuation().map(|v| v.enterprise_value)
        );
        assert!(grid
            .result
            .matrix
            .iter()
            .flatten()
            .all(|v| v.is_some_and(|ev| ev > Decimal::ZERO)));
    }
}
