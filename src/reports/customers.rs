use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::stats::TOP_LIMIT;
use crate::domain::{Customer, Sale};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSales {
    pub customer_id: String,
    pub customer_name: String,
    pub total_purchases: u32,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomersReport {
    pub total_customers: usize,
    /// Best customers by spend over the sales given, at most [`TOP_LIMIT`].
    pub top_customers: Vec<CustomerSales>,
}

/// Ranks customers from the sales themselves rather than the stored
/// aggregates, so a missed aggregate update does not skew the ranking.
pub fn customers_report(customers: &[Customer], sales: &[Sale]) -> CustomersReport {
    let mut spend: HashMap<&str, CustomerSales> = HashMap::new();
    for sale in sales {
        let Some(customer) = &sale.customer else {
            continue;
        };
        let entry = spend.entry(&customer.id).or_insert_with(|| CustomerSales {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            total_purchases: 0,
            total_spent: Decimal::ZERO,
        });
        entry.total_purchases += 1;
        entry.total_spent += sale.total;
    }

    let mut top_customers: Vec<CustomerSales> = spend.into_values().collect();
    top_customers.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    top_customers.truncate(TOP_LIMIT);

    CustomersReport {
        total_customers: customers.len(),
        top_customers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerSnapshot, SaleLine};
    use chrono::Utc;

    fn sale(customer: Option<(&str, &str)>, price: i64) -> Sale {
        let line = SaleLine {
            product_id: "p1".into(),
            product_name: "Drill".into(),
            quantity: 1,
            unit_price: Decimal::new(price, 0),
        };
        let customer = customer.map(|(id, name)| CustomerSnapshot {
            id: id.into(),
            name: name.into(),
        });
        Sale::new("s", vec![line], customer, "u1", Utc::now())
    }

    #[test]
    fn test_top_customers_ranked_by_spend() {
        let customers = vec![Customer::new("c1", "Ana", "1"), Customer::new("c2", "Bo", "2")];
        let sales = vec![
            sale(Some(("c1", "Ana")), 40),
            sale(Some(("c2", "Bo")), 100),
            sale(Some(("c1", "Ana")), 70),
            sale(None, 999),
        ];
        let report = customers_report(&customers, &sales);

        assert_eq!(report.total_customers, 2);
        let ranked: Vec<_> = report
            .top_customers
            .iter()
            .map(|c| (c.customer_id.as_str(), c.total_purchases, c.total_spent))
            .collect();
        assert_eq!(
            ranked,
            vec![("c1", 2, Decimal::new(110, 0)), ("c2", 1, Decimal::new(100, 0))]
        );
    }
}
