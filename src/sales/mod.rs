//! Sale ledger records, cart validation, the commit step and outcomes.

pub mod commit;
mod dtos;
pub mod entity;
pub mod error;
pub mod outcome;

pub use commit::IDEMPOTENCY_COLLECTION;
pub use dtos::*;
pub use error::*;
pub use outcome::*;
