//! System orchestration, startup, and shutdown logic.

pub mod config;
pub mod error;
pub mod retail_system;
pub mod telemetry;

pub use config::*;
pub use error::*;
pub use retail_system::*;
pub use telemetry::*;
