//! Error types for the tabenc encoders

use thiserror::Error;

/// Result type alias for tabenc operations
pub type Result<T> = std::result::Result<T, TabencError>;

/// Main error type for the tabenc crate
#[derive(Error, Debug)]
pub enum TabencError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoder not fitted")]
    NotFitted,

    #[error("Label series required but not provided")]
    MissingLabel,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for TabencError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabencError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabencError {
    fn from(err: serde_json::Error) -> Self {
        TabencError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabencError::InvalidInput("nulls present".to_string());
        assert_eq!(err.to_string(), "Invalid input: nulls present");
    }

    #[test]
    fn test_not_fitted_display() {
        assert_eq!(TabencError::NotFitted.to_string(), "Encoder not fitted");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::error::PolarsError::NoData("empty".into());
        let err: TabencError = polars_err.into();
        assert!(matches!(err, TabencError::DataError(_)));
    }
}
