use rust_decimal::Decimal;
use thiserror::Error;

/// Failures while reading the input workbook into a parameter bundle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// A required sheet (label `None`) or labelled row is absent.
    #[error("Missing schema: section '{section}'{}", .label.as_ref().map(|l| format!(", label '{l}'")).unwrap_or_default())]
    MissingSchema {
        section: String,
        label: Option<String>,
    },

    /// The section exists but its layout does not match the fixed schema.
    #[error("Malformed schema in section '{section}': {detail}")]
    MalformedSchema { section: String, detail: String },

    /// The workbook file itself could not be opened or decoded.
    #[error("Workbook error: {0}")]
    Workbook(String),
}

impl LoadError {
    pub fn missing_section(section: &str) -> Self {
        LoadError::MissingSchema {
            section: section.to_string(),
            label: None,
        }
    }

    pub fn missing_label(section: &str, label: &str) -> Self {
        LoadError::MissingSchema {
            section: section.to_string(),
            label: Some(label.to_string()),
        }
    }

    /// Section name used when the whole file is unreadable.
    pub const WORKBOOK_SECTION: &str = "<workbook>";

    /// Reader failures become `MalformedSchema` for the whole workbook; the
    /// other kinds pass through unchanged.
    pub fn into_schema_error(self) -> Self {
        match self {
            LoadError::Workbook(detail) => LoadError::malformed(Self::WORKBOOK_SECTION, detail),
            other => other,
        }
    }

    pub fn malformed(section: &str, detail: impl Into<String>) -> Self {
        LoadError::MalformedSchema {
            section: section.to_string(),
            detail: detail.into(),
        }
    }
}

/// Failures while projecting or valuing a loaded bundle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("Missing input: {parameter}{}", .year.map(|y| format!(" for forecast year {y}")).unwrap_or_default())]
    MissingInput {
        parameter: String,
        year: Option<u32>,
    },

    #[error("Non-convergent terminal value: WACC ({wacc}) must exceed perpetuity growth ({growth})")]
    NonConvergentTerminalValue { wacc: Decimal, growth: Decimal },

    #[error("Invalid rate: {field} = {value}: {reason}")]
    InvalidRate {
        field: String,
        value: Decimal,
        reason: String,
    },
}

impl ComputationError {
    pub fn missing(parameter: &str, year: Option<u32>) -> Self {
        ComputationError::MissingInput {
            parameter: parameter.to_string(),
            year,
        }
    }

    /// A line item left the decimal range; `value` is the operand that pushed it out.
    pub fn overflow(field: &str, year: Option<u32>, value: Decimal) -> Self {
        let field = match year {
            Some(y) => format!("{field} (forecast year {y})"),
            None => field.to_string(),
        };
        ComputationError::InvalidRate {
            field,
            value,
            reason: "result exceeds the decimal range".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DcfModelError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Computation(#[from] ComputationError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DcfModelError {
    fn from(e: serde_json::Error) -> Self {
        DcfModelError::SerializationError(e.to_string())
    }
}
