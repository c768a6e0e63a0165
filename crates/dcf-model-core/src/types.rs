use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency amounts read from or derived from the workbook.
pub type Money = Decimal;

/// Fractions (0.05 = 5%). Percent inputs are converted on the way in.
pub type Rate = Decimal;

/// Valuation multiples such as EV / EBITDA.
pub type Multiple = Decimal;

/// Day counts used by the working-capital turnover ratios.
pub type Days = Decimal;

/// Result of a model operation plus the context needed to reproduce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

impl<T: Serialize> ComputationOutput<T> {
    /// Swap the payload, keeping methodology, warnings and metadata.
    pub fn map_result<U: Serialize>(self, f: impl FnOnce(T) -> U) -> ComputationOutput<U> {
        ComputationOutput {
            result: f(self.result),
            methodology: self.methodology,
            assumptions: self.assumptions,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Microseconds since `start`, saturating.
pub fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Build the output envelope. `assumptions` is any serializable description
/// of the inputs; it degrades to `null` if serialization fails.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_owned(),
        assumptions: serde_json::to_value(assumptions).unwrap_or(serde_json::Value::Null),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            computation_time_us: elapsed_us,
            precision: "decimal128".to_owned(),
        },
    }
}
