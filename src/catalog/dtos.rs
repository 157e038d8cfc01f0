use rust_decimal::Decimal;

// DTOs for Product
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    pub low_stock_threshold: Option<u32>,
}

/// Catalog edits. Stock is deliberately absent: it only moves through
/// `adjust_stock` and the sale workflow.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub low_stock_threshold: Option<u32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.low_stock_threshold.is_none()
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.category.is_some() {
            fields.push("category");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.low_stock_threshold.is_some() {
            fields.push("low_stock_threshold");
        }
        fields
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Only products at or below their own low-stock threshold.
    pub low_stock_only: bool,
    pub limit: Option<usize>,
}
