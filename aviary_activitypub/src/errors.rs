use serde_json::{Error as DeserializationError};
use thiserror::Error;

use aviary_fetch::{deliver::DelivererError, fetch::FetchError};
use aviary_models::database::DatabaseError;
use aviary_validators::errors::ValidationError;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    FetchError(#[from] FetchError),

    #[error(transparent)]
    DelivererError(#[from] DelivererError),

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),

    #[error("{0}")]
    ServiceError(&'static str),
}

impl HandlerError {
    /// Retrying will not help for these errors
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::FetchError(error) => error.is_terminal(),
            Self::DelivererError(error) => error.is_terminal(),
            Self::ValidationError(_) => true,
            Self::DatabaseError(_) => false,
            Self::ServiceError(_) => false,
        }
    }
}

impl From<DeserializationError> for HandlerError {
    fn from(error: DeserializationError) -> Self {
        Self::ValidationError(format!("deserialization error: {error}"))
    }
}

impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationError(error.to_string())
    }
}
