use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Dataset has no coordinate values to partition")]
    EmptyInput,

    #[error("Column not found: {name} (available: {available:?})")]
    ColumnMismatch { name: String, available: Vec<String> },

    #[error("Quantile {0} is outside the open interval (0, 1)")]
    InvalidQuantile(f64),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unknown measure: {name} (measured variables: {measured:?})")]
    UnknownMeasure { name: String, measured: Vec<String> },

    #[error("Invalid interval range: lower={lower}, upper={upper} (require 0 < lower < upper < 1)")]
    InvalidRange { lower: f64, upper: f64 },

    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SummaryError>;
