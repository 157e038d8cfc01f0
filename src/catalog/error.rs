use thiserror::Error;

use crate::domain::AccessDenied;
use crate::store::StoreError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        requested: u32,
        available: u32,
    },
    #[error("Stock for {product_id} cannot grow by {quantity} from {current}")]
    StockOverflow {
        product_id: String,
        current: u32,
        quantity: u32,
    },
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Product {0} is referenced by recorded sales and cannot be deleted")]
    InUse(String),
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("Store communication error: {0}")]
    Transport(String),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => CatalogError::NotFound(id),
            StoreError::Record(record) => CatalogError::InvalidProduct(record.to_string()),
            other => CatalogError::Transport(other.to_string()),
        }
    }
}
