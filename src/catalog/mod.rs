//! Product catalog: record mapping, stock rules and errors.

mod dtos;
pub mod entity;
pub mod error;
pub mod stock;

pub use dtos::*;
pub use error::*;
pub use stock::*;
