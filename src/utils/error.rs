use thiserror::Error;
use uuid::Uuid;

use crate::models::packet::Field;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON serialization/deserialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No filter rule with this id
    #[error("Filter rule {0} not found")]
    RuleNotFound(Uuid),

    /// Field is not filterable for the active protocol
    #[error("Field {0} is not part of the active protocol")]
    FieldNotInSchema(Field),

    /// Error from the bus driver
    #[error("Driver error: {0}")]
    DriverError(String),

    /// Generic error
    #[error("{0}")]
    GenericError(String),
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;
