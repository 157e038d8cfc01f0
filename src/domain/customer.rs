use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered customer with rolling purchase aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub total_purchases: u32,
    #[serde(default)]
    pub total_spent: Decimal,
    #[serde(default)]
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            tax_id: None,
            address: None,
            birthdate: None,
            total_purchases: 0,
            total_spent: Decimal::ZERO,
            last_purchase_at: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    /// Folds one completed purchase into the aggregates.
    pub fn apply_purchase(&mut self, amount: Decimal, at: DateTime<Utc>) {
        self.total_purchases += 1;
        self.total_spent += amount;
        self.last_purchase_at = Some(at);
    }

    pub fn average_ticket(&self) -> Decimal {
        if self.total_purchases == 0 {
            Decimal::ZERO
        } else {
            self.total_spent / Decimal::from(self.total_purchases)
        }
    }
}
