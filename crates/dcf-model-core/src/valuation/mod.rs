pub mod projection;
pub mod terminal;

pub use projection::{project, YearProjection};
pub use terminal::{value, valuation_warnings, ValuationResult, ValuationSummary};
