use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Medium,
    High,
}

/// An alert addressed to one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn low_stock(
        owner: impl Into<String>,
        product_id: impl Into<String>,
        product_name: &str,
        current_stock: u32,
        priority: Priority,
    ) -> Self {
        Self {
            id: String::new(),
            kind: NotificationKind::LowStock,
            title: "Low stock".to_string(),
            message: format!("{product_name} is running low ({current_stock} units left)"),
            product_id: Some(product_id.into()),
            priority,
            read: false,
            read_at: None,
            owner: owner.into(),
            created_at: Utc::now(),
        }
    }
}
