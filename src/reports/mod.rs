//! Read-only aggregations over the ledgers.

mod customers;
mod error;
mod inventory;
mod stats;

pub use customers::*;
pub use error::*;
pub use inventory::*;
pub use stats::*;
