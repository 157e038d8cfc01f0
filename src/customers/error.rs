use thiserror::Error;

use crate::domain::AccessDenied;
use crate::store::StoreError;

/// Errors that can occur during customer operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustomerError {
    #[error("Customer not found: {0}")]
    NotFound(String),
    #[error("Customer validation error: {0}")]
    ValidationError(String),
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("Store communication error: {0}")]
    Transport(String),
}

impl From<StoreError> for CustomerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => CustomerError::NotFound(id),
            StoreError::Record(record) => CustomerError::ValidationError(record.to_string()),
            other => CustomerError::Transport(other.to_string()),
        }
    }
}
