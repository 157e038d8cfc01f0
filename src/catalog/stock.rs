use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Priority, DEFAULT_LOW_STOCK_THRESHOLD};

pub const DEFAULT_CRITICAL_STOCK_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMode {
    Increment,
    Decrement,
    Set,
}

/// Why a stock adjustment could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockRejected {
    /// A decrement would go below zero.
    Insufficient,
    /// An increment would exceed the largest representable stock.
    Overflow,
}

/// A requested change to a product's stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub mode: StockMode,
    pub quantity: u32,
}

impl StockAdjustment {
    pub fn increment(quantity: u32) -> Self {
        Self { mode: StockMode::Increment, quantity }
    }

    pub fn decrement(quantity: u32) -> Self {
        Self { mode: StockMode::Decrement, quantity }
    }

    pub fn set(quantity: u32) -> Self {
        Self { mode: StockMode::Set, quantity }
    }

    pub fn apply(&self, current: u32) -> Result<u32, StockRejected> {
        match self.mode {
            StockMode::Increment => current.checked_add(self.quantity).ok_or(StockRejected::Overflow),
            StockMode::Decrement => current.checked_sub(self.quantity).ok_or(StockRejected::Insufficient),
            StockMode::Set => Ok(self.quantity),
        }
    }
}

/// Store-wide stock alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    /// Threshold given to products created without one.
    pub low_stock_threshold: u32,
    /// At or below this level an alert is raised as high priority.
    pub critical_stock_threshold: u32,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            critical_stock_threshold: DEFAULT_CRITICAL_STOCK_THRESHOLD,
        }
    }
}

impl StockPolicy {
    pub fn alert_priority(&self, product_threshold: u32, stock: u32) -> Option<Priority> {
        if stock > product_threshold {
            None
        } else if stock <= self.critical_stock_threshold {
            Some(Priority::High)
        } else {
            Some(Priority::Medium)
        }
    }
}

/// The committed outcome of a stock mutation on one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub product_name: String,
    pub previous: u32,
    pub current: u32,
    pub threshold: u32,
}

impl StockChange {
    pub fn alert_priority(&self, policy: &StockPolicy) -> Option<Priority> {
        policy.alert_priority(self.threshold, self.current)
    }
}

/// Result of a direct stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: String,
    pub stock: u32,
    /// Priority of the low-stock alert that was recorded, if any.
    pub alert: Option<Priority>,
}

/// The fields every stock mutation writes.
#[derive(Serialize)]
pub(crate) struct StockPatch<'a> {
    pub stock: u32,
    pub updated_at: DateTime<Utc>,
    pub updated_by: &'a str,
}
