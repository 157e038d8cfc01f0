use thiserror::Error;

use crate::catalog::CatalogError;
use crate::customers::CustomerError;
use crate::domain::AccessDenied;
use crate::sales::SaleError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("Could not load sales: {0}")]
    Sales(#[from] SaleError),
    #[error("Could not load products: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Could not load customers: {0}")]
    Customers(#[from] CustomerError),
}
