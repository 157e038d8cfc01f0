use crate::domain::{compute_total, Sale};
use crate::store::Record;

impl Record for Sale {
    const COLLECTION: &'static str = "sales";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("sale must have at least one line".to_string());
        }
        if let Some(line) = self.items.iter().find(|line| line.quantity == 0) {
            return Err(format!("line for {} has zero quantity", line.product_id));
        }
        let expected = compute_total(&self.items);
        if self.total != expected {
            return Err(format!("total {} does not match lines ({expected})", self.total));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SaleLine;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_sale_total_must_match_lines() {
        let line = SaleLine {
            product_id: "p1".into(),
            product_name: "Drill".into(),
            quantity: 2,
            unit_price: Decimal::new(1000, 2),
        };
        let mut sale = Sale::new("s1", vec![line], None, "u1", Utc::now());
        assert!(sale.validate().is_ok());

        sale.total = Decimal::new(1, 0);
        assert!(sale.validate().is_err());

        sale.items.clear();
        sale.total = Decimal::ZERO;
        assert!(sale.validate().is_err());
    }
}
