use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerFrameError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{column}' could not be converted to a numeric type: {details}")]
    ColumnNotNumeric { column: String, details: String },

    #[error("Could not parse '{value}' in column '{column}' as a date")]
    DateParse { column: String, value: String },

    #[error("Invalid installment count {count} at row {row}: must be at least 1")]
    InvalidInstallmentCount { row: usize, count: i64 },

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(i64),

    #[error("Invalid amortization parameters: {0}")]
    InvalidSchedule(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, LedgerFrameError>;
