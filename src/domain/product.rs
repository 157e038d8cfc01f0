use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

fn default_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Represents a product in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        stock: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            created_at: now,
            updated_at: now,
            updated_by: None,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Value of the units on hand at the current price.
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock)
    }
}
