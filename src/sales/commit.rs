//! The atomic half of a sale: everything here runs inside one store
//! transaction and may be re-run from scratch if the commit loses a race.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::dtos::{CartLine, SaleCustomer};
use super::error::SaleError;
use crate::catalog::stock::StockPatch;
use crate::catalog::{StockAdjustment, StockChange};
use crate::domain::{Customer, CustomerSnapshot, Product, Sale, SaleLine};
use crate::store::{encode, field_str, Record, StoreClient, Transaction};

/// Maps idempotency keys to the sale they produced.
pub const IDEMPOTENCY_COLLECTION: &str = "sale_keys";

/// Everything the commit needs, owned so each attempt can borrow it afresh.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub lines: Vec<CartLine>,
    pub customer: Option<SaleCustomer>,
    pub seller_id: String,
    pub seller_email: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Committed {
    Sold { sale: Sale, changes: Vec<StockChange> },
    Replayed(Sale),
}

#[derive(Serialize)]
struct IdempotencyEntry<'a> {
    sale_id: &'a str,
    created_at: DateTime<Utc>,
}

/// Re-reads every product, decrements stock and writes the sale.
///
/// Any shortfall aborts with `InsufficientStock` before a single write is
/// sent, so a failed attempt leaves the store untouched.
pub async fn commit_sale(tx: &mut Transaction, draft: &SaleDraft) -> Result<Committed, SaleError> {
    if let Some(key) = &draft.idempotency_key {
        if let Some(sale) = replay_in_tx(tx, key).await? {
            return Ok(Committed::Replayed(sale));
        }
    }

    let now = Utc::now();
    let mut items = Vec::with_capacity(draft.lines.len());
    let mut changes = Vec::with_capacity(draft.lines.len());

    for line in &draft.lines {
        let product: Product = tx
            .get_record(&line.product_id)
            .await?
            .ok_or_else(|| SaleError::ProductNotFound(line.product_id.clone()))?;

        let remaining = StockAdjustment::decrement(line.quantity)
            .apply(product.stock)
            .map_err(|_| SaleError::InsufficientStock {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                requested: line.quantity,
                available: product.stock,
            })?;

        let patch = encode(
            Product::COLLECTION,
            &StockPatch {
                stock: remaining,
                updated_at: now,
                updated_by: &draft.seller_id,
            },
        )?;
        tx.update(Product::COLLECTION, &product.id, patch);

        items.push(SaleLine::snapshot(&product, line.quantity));
        changes.push(StockChange {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            previous: product.stock,
            current: remaining,
            threshold: product.low_stock_threshold,
        });
    }

    let customer = match &draft.customer {
        None => None,
        Some(SaleCustomer::Existing(existing)) => Some(CustomerSnapshot {
            id: existing.id.clone(),
            name: existing.name.clone(),
        }),
        Some(SaleCustomer::New(create)) => {
            let record: Customer = create.clone().into_customer(&draft.seller_id);
            let id = tx.create(Customer::COLLECTION, record.to_document()?);
            Some(CustomerSnapshot { id, name: record.name })
        }
    };

    let mut sale = Sale::new(Uuid::new_v4().to_string(), items, customer, &draft.seller_id, now);
    sale.seller_email = Some(draft.seller_email.clone());
    sale.idempotency_key = draft.idempotency_key.clone();
    tx.set_record(&sale)?;

    if let Some(key) = &draft.idempotency_key {
        let entry = encode(
            IDEMPOTENCY_COLLECTION,
            &IdempotencyEntry {
                sale_id: &sale.id,
                created_at: now,
            },
        )?;
        tx.set(IDEMPOTENCY_COLLECTION, key, entry);
    }

    Ok(Committed::Sold { sale, changes })
}

async fn replay_in_tx(tx: &mut Transaction, key: &str) -> Result<Option<Sale>, SaleError> {
    let Some(entry) = tx.get(IDEMPOTENCY_COLLECTION, key).await? else {
        return Ok(None);
    };
    let sale_id = replayed_sale_id(key, &entry)?;
    let sale = tx
        .get_record::<Sale>(&sale_id)
        .await?
        .ok_or(SaleError::NotFound(sale_id))?;
    Ok(Some(sale))
}

/// Looks an idempotency key up outside any transaction.
pub async fn find_replay(store: &StoreClient, key: &str) -> Result<Option<Sale>, SaleError> {
    let Some(entry) = store.get(IDEMPOTENCY_COLLECTION, key).await? else {
        return Ok(None);
    };
    let sale_id = replayed_sale_id(key, &entry.data)?;
    let sale = store
        .get_record::<Sale>(&sale_id)
        .await?
        .ok_or(SaleError::NotFound(sale_id))?;
    Ok(Some(sale))
}

fn replayed_sale_id(key: &str, entry: &crate::store::Document) -> Result<String, SaleError> {
    field_str(entry, "sale_id")
        .map(str::to_string)
        .ok_or_else(|| SaleError::InvalidRecord(format!("idempotency entry {key} has no sale id")))
}
