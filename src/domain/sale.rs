use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

/// One sold line, with the product name and price copied at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SaleLine {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Customer id and name as they were when the sale was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
}

/// A recorded sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default)]
    pub id: String,
    pub items: Vec<SaleLine>,
    pub total: Decimal,
    #[serde(default)]
    pub customer: Option<CustomerSnapshot>,
    pub seller_id: String,
    #[serde(default)]
    pub seller_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: SaleStatus,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

pub fn compute_total(items: &[SaleLine]) -> Decimal {
    items.iter().map(SaleLine::subtotal).sum()
}

impl Sale {
    pub fn new(
        id: impl Into<String>,
        items: Vec<SaleLine>,
        customer: Option<CustomerSnapshot>,
        seller_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total = compute_total(&items);
        Self {
            id: id.into(),
            items,
            total,
            customer,
            seller_id: seller_id.into(),
            seller_email: None,
            created_at,
            status: SaleStatus::Completed,
            idempotency_key: None,
        }
    }

    /// Total units sold. Widened so a sale of large lines cannot overflow.
    pub fn units(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn references_product(&self, product_id: &str) -> bool {
        self.items.iter().any(|line| line.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(id: &str, quantity: u32, cents: i64) -> SaleLine {
        SaleLine {
            product_id: id.into(),
            product_name: id.to_uppercase(),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_sale_total_is_sum_of_line_subtotals() {
        let sale = Sale::new("s1", vec![line("p1", 2, 10000), line("p2", 3, 250)], None, "u1", Utc::now());
        assert_eq!(sale.total, Decimal::new(20750, 2));
        assert_eq!(sale.units(), 5);
        assert!(sale.references_product("p2"));
        assert!(!sale.references_product("p3"));
    }

    #[test]
    fn test_units_of_large_lines_do_not_overflow() {
        let sale = Sale::new(
            "s1",
            vec![line("p1", 3_000_000_000, 1), line("p2", 3_000_000_000, 1)],
            None,
            "u1",
            Utc::now(),
        );
        assert_eq!(sale.units(), 6_000_000_000);
    }

    proptest! {
        #[test]
        fn prop_total_matches_line_arithmetic(lines in prop::collection::vec((1u32..50, 0i64..1_000_000), 1..8)) {
            let items: Vec<SaleLine> = lines
                .iter()
                .enumerate()
                .map(|(i, (q, cents))| line(&format!("p{i}"), *q, *cents))
                .collect();
            let expected_cents: i64 = lines.iter().map(|(q, c)| i64::from(*q) * c).sum();
            prop_assert_eq!(compute_total(&items), Decimal::new(expected_cents, 2));
        }
    }
}
