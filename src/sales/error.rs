use thiserror::Error;

use super::dtos::CartError;
use crate::domain::AccessDenied;
use crate::store::{RecordError, StoreError};

/// Errors that abort a sale. Nothing has been written when one is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SaleError {
    #[error("Invalid cart: {0}")]
    Validation(#[from] CartError),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        requested: u32,
        available: u32,
    },
    #[error("Sale not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Store unavailable, the sale may be retried: {0}")]
    Transport(String),
}

impl SaleError {
    /// Whether resubmitting the same request can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaleError::Transport(_))
    }
}

impl From<StoreError> for SaleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } if collection == "products" => {
                SaleError::ProductNotFound(id)
            }
            StoreError::NotFound { id, .. } => SaleError::NotFound(id),
            StoreError::Record(record) => SaleError::InvalidRecord(record.to_string()),
            other => SaleError::Transport(other.to_string()),
        }
    }
}

impl From<RecordError> for SaleError {
    fn from(e: RecordError) -> Self {
        SaleError::InvalidRecord(e.to_string())
    }
}
