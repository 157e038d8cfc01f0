use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(String),
    #[error("Invalid notification: {0}")]
    Invalid(String),
    #[error("Store communication error: {0}")]
    Transport(String),
}

impl From<StoreError> for NotificationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => NotificationError::NotFound(id),
            StoreError::Record(record) => NotificationError::Invalid(record.to_string()),
            other => NotificationError::Transport(other.to_string()),
        }
    }
}
