//! Runtime configuration, read from the environment with defaults.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{StockPolicy, DEFAULT_CRITICAL_STOCK_THRESHOLD};
use crate::domain::DEFAULT_LOW_STOCK_THRESHOLD;

pub const DEFAULT_CHANNEL_BUFFER: usize = 32;
pub const DEFAULT_TX_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailConfig {
    /// Capacity of the store actor's request channel.
    pub channel_buffer: usize,
    /// Attempts an optimistic transaction gets before giving up.
    pub tx_max_attempts: u32,
    pub stock: StockPolicy,
}

impl Default for RetailConfig {
    fn default() -> Self {
        Self {
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            tx_max_attempts: DEFAULT_TX_MAX_ATTEMPTS,
            stock: StockPolicy::default(),
        }
    }
}

impl RetailConfig {
    /// Loads `.env` if present, then reads `STOCKROOM_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys take their default;
    /// unparsable or zero values are logged and also take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            channel_buffer: positive(&lookup, "STOCKROOM_CHANNEL_BUFFER", DEFAULT_CHANNEL_BUFFER),
            tx_max_attempts: positive(&lookup, "STOCKROOM_TX_MAX_ATTEMPTS", DEFAULT_TX_MAX_ATTEMPTS),
            stock: StockPolicy {
                low_stock_threshold: positive(&lookup, "STOCKROOM_LOW_STOCK_THRESHOLD", DEFAULT_LOW_STOCK_THRESHOLD),
                critical_stock_threshold: positive(
                    &lookup,
                    "STOCKROOM_CRITICAL_STOCK_THRESHOLD",
                    DEFAULT_CRITICAL_STOCK_THRESHOLD,
                ),
            },
        }
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!(key, value = %raw, default = %default, "Invalid configuration value, using default");
            default
        }
    }
}
