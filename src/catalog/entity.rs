use crate::domain::{Category, Product};
use crate::store::Record;

impl Record for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> &str {
        &self.id
    }

    /// Stock is unsigned, so it cannot go negative; the remaining checks are
    /// the ones the type system does not cover.
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name must not be empty".to_string());
        }
        if self.price.is_sign_negative() {
            return Err(format!("price must not be negative, got {}", self.price));
        }
        if self.low_stock_threshold == 0 {
            return Err("low-stock threshold must be positive".to_string());
        }
        Ok(())
    }
}

impl Record for Category {
    const COLLECTION: &'static str = "categories";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("category name must not be empty".to_string());
        }
        Ok(())
    }
}
