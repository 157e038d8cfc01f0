use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Product;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySummary {
    pub count: usize,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryReport {
    pub total_products: usize,
    /// Sum of price times stock.
    pub total_value: Decimal,
    /// In stock but at or below the product's own threshold.
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    pub categories: BTreeMap<String, CategorySummary>,
}

pub fn inventory_report(products: &[Product]) -> InventoryReport {
    let mut report = InventoryReport {
        total_products: products.len(),
        total_value: Decimal::ZERO,
        low_stock: Vec::new(),
        out_of_stock: Vec::new(),
        categories: BTreeMap::new(),
    };
    for product in products {
        let value = product.stock_value();
        report.total_value += value;
        if product.is_out_of_stock() {
            report.out_of_stock.push(product.clone());
        } else if product.is_low_stock() {
            report.low_stock.push(product.clone());
        }
        let category = report.categories.entry(product.category.clone()).or_default();
        category.count += 1;
        category.value += value;
    }
    report
}
