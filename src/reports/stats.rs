use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::Sale;

/// Length of the top-N lists in every report.
pub const TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown period: {0}")]
pub struct UnknownPeriod(pub String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}

impl Period {
    /// First instant covered by the period ending at `now`. Calendar periods
    /// start at midnight UTC; a week is the trailing seven days.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let first_day = match self {
            Period::Week => return now - Duration::days(7),
            Period::Day => today,
            Period::Month => today - Days::new(u64::from(today.day0())),
            Period::Year => today - Days::new(u64::from(today.ordinal0())),
        };
        first_day.and_time(NaiveTime::MIN).and_utc()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStats {
    pub total_sales: usize,
    pub total_revenue: Decimal,
    pub average_ticket: Decimal,
    /// Best sellers by revenue, at most [`TOP_LIMIT`].
    pub top_products: Vec<ProductSales>,
    /// Sale count keyed by `YYYY-MM-DD`.
    pub sales_by_day: BTreeMap<String, u32>,
    /// Sale count keyed by hour of day, 0 to 23.
    pub sales_by_hour: BTreeMap<u32, u32>,
}

pub fn sales_stats(sales: &[Sale]) -> SalesStats {
    let mut total_revenue = Decimal::ZERO;
    let mut products: HashMap<&str, ProductSales> = HashMap::new();
    let mut sales_by_day = BTreeMap::new();
    let mut sales_by_hour = BTreeMap::new();

    for sale in sales {
        total_revenue += sale.total;
        for line in &sale.items {
            let entry = products.entry(&line.product_id).or_insert_with(|| ProductSales {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += u64::from(line.quantity);
            entry.revenue += line.subtotal();
        }
        *sales_by_day
            .entry(sale.created_at.format("%Y-%m-%d").to_string())
            .or_insert(0) += 1;
        *sales_by_hour.entry(sale.created_at.hour()).or_insert(0) += 1;
    }

    let mut top_products: Vec<ProductSales> = products.into_values().collect();
    top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.product_id.cmp(&b.product_id)));
    top_products.truncate(TOP_LIMIT);

    let average_ticket = if sales.is_empty() {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(sales.len())
    };

    SalesStats {
        total_sales: sales.len(),
        total_revenue,
        average_ticket,
        top_products,
        sales_by_day,
        sales_by_hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SaleLine;
    use chrono::TimeZone;

    fn sale(at: DateTime<Utc>, lines: &[(&str, u32, i64)]) -> Sale {
        let items = lines
            .iter()
            .map(|(id, quantity, price)| SaleLine {
                product_id: id.to_string(),
                product_name: id.to_uppercase(),
                quantity: *quantity,
                unit_price: Decimal::new(*price, 0),
            })
            .collect();
        Sale::new("s", items, None, "u1", at)
    }

    #[test]
    fn test_period_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        assert_eq!(Period::Day.start(now), Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(Period::Week.start(now), Utc.with_ymd_and_hms(2024, 3, 8, 14, 30, 0).unwrap());
        assert_eq!(Period::Month.start(now), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(Period::Year.start(now), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!("Week".parse::<Period>(), Ok(Period::Week));
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_sales_stats_aggregates() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 14, 9, 5, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
        let sales = vec![
            sale(morning, &[("p1", 2, 100), ("p2", 1, 30)]),
            sale(evening, &[("p2", 10, 30)]),
            sale(evening, &[("p3", 1, 5)]),
        ];

        let stats = sales_stats(&sales);
        assert_eq!(stats.total_sales, 3);
        assert_eq!(stats.total_revenue, Decimal::new(535, 0));
        assert_eq!(stats.average_ticket, Decimal::new(535, 0) / Decimal::new(3, 0));
        let top: Vec<_> = stats
            .top_products
            .iter()
            .map(|p| (p.product_id.as_str(), p.quantity, p.revenue))
            .collect();
        assert_eq!(
            top,
            vec![
                ("p2", 11, Decimal::new(330, 0)),
                ("p1", 2, Decimal::new(200, 0)),
                ("p3", 1, Decimal::new(5, 0)),
            ]
        );
        assert_eq!(stats.sales_by_day.get("2024-03-15"), Some(&2));
        assert_eq!(stats.sales_by_hour.get(&9), Some(&1));
        assert_eq!(stats.sales_by_hour.get(&18), Some(&2));
    }

    #[test]
    fn test_product_quantity_sums_past_u32() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let sales = vec![sale(at, &[("p1", 3_000_000_000, 1)]), sale(at, &[("p1", 3_000_000_000, 1)])];
        let stats = sales_stats(&sales);
        assert_eq!(stats.top_products[0].quantity, 6_000_000_000);
    }

    #[test]
    fn test_empty_stats() {
        let stats = sales_stats(&[]);
        assert_eq!(stats.total_sales, 0);
        assert_eq!(stats.average_ticket, Decimal::ZERO);
        assert!(stats.top_products.is_empty());
    }
}
