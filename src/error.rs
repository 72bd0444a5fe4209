// src/error.rs
// Standardized error types for the problem service

use thiserror::Error;

/// Main error type for the serenissima library
#[derive(Error, Debug)]
pub enum SerenissimaError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The table store answered with a non-success status
    #[error("store error ({status}): {message}")]
    Store { status: u16, message: String },

    #[error("batch of {size} records exceeds the store limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using SerenissimaError
pub type Result<T> = std::result::Result<T, SerenissimaError>;

impl SerenissimaError {
    /// Build a store error from a response status and body
    pub fn store(status: u16, message: impl Into<String>) -> Self {
        SerenissimaError::Store {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = SerenissimaError::Config("AIRTABLE_API_KEY is not set".to_string());
        assert!(err.to_string().contains("configuration error"));
        assert!(err.to_string().contains("AIRTABLE_API_KEY"));
    }

    #[test]
    fn test_store_error() {
        let err = SerenissimaError::store(422, "INVALID_FILTER_BY_FORMULA");
        assert_eq!(err.to_string(), "store error (422): INVALID_FILTER_BY_FORMULA");
    }

    #[test]
    fn test_batch_too_large() {
        let err = SerenissimaError::BatchTooLarge { size: 11, limit: 10 };
        assert!(err.to_string().contains("11"));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: SerenissimaError = json_err.into();
        assert!(matches!(err, SerenissimaError::Json(_)));
    }
}
