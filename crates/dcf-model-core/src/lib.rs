pub mod error;
pub mod time_value;
pub mod types;

pub mod normalize;
pub mod workbook;

pub mod loader;
pub mod params;

pub mod valuation;

pub mod scenarios;

pub mod report;

pub mod model;

pub use error::{ComputationError, DcfModelError, LoadError};
pub use loader::{CellWarning, LoadOptions, LoadedBundle};
pub use model::{DcfModel, ModelRun, ModelStatus, RunStatus};
pub use params::{
    BaseAssumptions, ModelConfig, ParameterBundle, ProjectImpact, ProjectionDrivers,
    RevenueStream, Sensitivity,
};
pub use types::*;
pub use valuation::{ValuationResult, ValuationSummary, YearProjection};
pub use workbook::{Cell, Grid, Workbook};

/// Standard result type for all dcf-model operations
pub type DcfModelResult<T> = Result<T, DcfModelError>;
