//! Notification sink and activity log records.

pub mod entity;
pub mod error;

pub use error::*;

/// Most notifications returned by a single listing.
pub const LIST_LIMIT: usize = 50;
