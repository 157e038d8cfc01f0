use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    StockAdjusted,
    SaleCreated,
    CustomerRegistered,
}

/// Audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub actor_id: String,
    pub actor_email: String,
    #[serde(default)]
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}
