use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::customers::CustomerCreate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,
    #[error("quantity for product {0} must be at least 1")]
    ZeroQuantity(String),
    #[error("product {0} appears more than once")]
    DuplicateProduct(String),
}

/// A validated, ordered list of products and quantities to sell.
///
/// Only constructible through [`Cart::new`], so a `Cart` is never empty,
/// never holds a zero quantity and never repeats a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Result<Self, CartError> {
        if lines.is_empty() {
            return Err(CartError::Empty);
        }
        let mut seen = HashSet::new();
        for line in &lines {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity(line.product_id.clone()));
            }
            if !seen.insert(line.product_id.as_str()) {
                return Err(CartError::DuplicateProduct(line.product_id.clone()));
            }
        }
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

/// An existing customer as the seller picked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum SaleCustomer {
    Existing(CustomerRef),
    /// Registered in the same commit as the sale.
    New(CustomerCreate),
}

#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub cart: Cart,
    pub customer: Option<SaleCustomer>,
    /// Caller-chosen token; resubmitting the same key returns the first sale.
    pub idempotency_key: Option<String>,
}

impl SaleRequest {
    pub fn new(cart: Cart) -> Self {
        Self {
            cart,
            customer: None,
            idempotency_key: None,
        }
    }

    pub fn for_customer(mut self, customer: CustomerRef) -> Self {
        self.customer = Some(SaleCustomer::Existing(customer));
        self
    }

    pub fn for_new_customer(mut self, customer: CustomerCreate) -> Self {
        self.customer = Some(SaleCustomer::New(customer));
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
    pub seller_id: Option<String>,
    pub limit: Option<usize>,
}
