//! The sale workflow.
//!
//! A sale runs in three steps:
//!
//! 1. **Pre-check**: read every product in the cart and fail fast on a
//!    missing product or short stock. Advisory only; it holds nothing.
//! 2. **Commit**: one optimistic transaction re-reads the products,
//!    decrements stock and writes the sale. Either all of it lands or none.
//! 3. **Side effects**: customer aggregates, low-stock alerts and the
//!    activity entry. These run after the commit and can only downgrade the
//!    result to [`SaleOutcome::PartialSuccess`], never undo the sale.

use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use super::{ActivityClient, CatalogClient, CustomerClient};
use crate::domain::{ActivityKind, Permission, Product, Sale, Session};
use crate::sales::commit::{commit_sale, find_replay, Committed, SaleDraft};
use crate::sales::{Cart, SaleError, SaleFilter, SaleOutcome, SaleRequest, SideEffectFailure};
use crate::store::{CompareOp, Direction, Query, Record, StoreClient};

#[derive(Clone)]
pub struct SaleClient {
    store: StoreClient,
    catalog: CatalogClient,
    customers: CustomerClient,
    activity: ActivityClient,
    max_attempts: u32,
}

impl_record_reads!(SaleClient, Sale, SaleError, sale);

impl SaleClient {
    pub fn new(
        store: StoreClient,
        catalog: CatalogClient,
        customers: CustomerClient,
        activity: ActivityClient,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            catalog,
            customers,
            activity,
            max_attempts,
        }
    }

    /// Checks every cart line against live stock without writing anything.
    /// Returns the products in cart order.
    #[instrument(skip(self, cart), fields(lines = cart.lines().len()))]
    pub async fn precheck(&self, cart: &Cart) -> Result<Vec<Product>, SaleError> {
        debug!("Sending request");
        let mut products = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = self
                .store
                .get_record::<Product>(&line.product_id)
                .await?
                .ok_or_else(|| SaleError::ProductNotFound(line.product_id.clone()))?;
            if product.stock < line.quantity {
                return Err(SaleError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            products.push(product);
        }
        Ok(products)
    }

    #[instrument(skip(self, session, request), fields(seller = %session.user_id))]
    pub async fn sell(&self, session: &Session, request: SaleRequest) -> Result<SaleOutcome, SaleError> {
        session.require(Permission::ManageSales)?;

        if let Some(key) = &request.idempotency_key {
            if let Some(sale) = find_replay(&self.store, key).await? {
                info!(sale_id = %sale.id, "Idempotency key already used, returning recorded sale");
                return Ok(SaleOutcome::Replayed(sale));
            }
        }

        self.precheck(&request.cart).await?;

        let draft = SaleDraft {
            lines: request.cart.lines().to_vec(),
            customer: request.customer,
            seller_id: session.user_id.clone(),
            seller_email: session.email.clone(),
            idempotency_key: request.idempotency_key,
        };
        let committed = self
            .store
            .run_transaction(self.max_attempts, |tx| {
                let draft = draft.clone();
                Box::pin(async move { commit_sale(tx, &draft).await })
            })
            .await
            .map_err(|e| {
                error!(error = %e, "Sale aborted");
                e
            })?;

        let (sale, changes) = match committed {
            Committed::Replayed(sale) => {
                info!(sale_id = %sale.id, "Idempotency key claimed concurrently, returning recorded sale");
                return Ok(SaleOutcome::Replayed(sale));
            }
            Committed::Sold { sale, changes } => (sale, changes),
        };
        info!(sale_id = %sale.id, total = %sale.total, units = sale.units(), "Sale committed");

        let mut failures = Vec::new();
        if let Some(customer) = &sale.customer {
            if let Err(e) = self
                .customers
                .record_purchase(&customer.id, sale.total, sale.created_at)
                .await
            {
                warn!(customer_id = %customer.id, error = %e, "Customer aggregates not updated");
                failures.push(SideEffectFailure::CustomerAggregate {
                    customer_id: customer.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
        for change in &changes {
            if let Err(e) = self.catalog.raise_low_stock_alert(&session.user_id, change).await {
                warn!(product_id = %change.product_id, error = %e, "Low-stock alert not recorded");
                failures.push(SideEffectFailure::LowStockAlert {
                    product_id: change.product_id.clone(),
                    product_name: change.product_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        self.activity
            .log(
                session,
                ActivityKind::SaleCreated,
                json!({
                    "sale_id": sale.id,
                    "total": sale.total,
                    "units": sale.units(),
                    "customer_id": sale.customer.as_ref().map(|c| c.id.as_str()),
                }),
            )
            .await;

        Ok(SaleOutcome::from_failures(sale, failures))
    }

    /// Newest first.
    #[instrument(skip(self, session))]
    pub async fn list_sales(&self, session: &Session, filter: SaleFilter) -> Result<Vec<Sale>, SaleError> {
        debug!("Sending request");
        session.require(Permission::ViewSales)?;
        let mut query = Query::collection(Sale::COLLECTION);
        if let Some(since) = filter.since {
            query = query.where_op("created_at", CompareOp::Gte, since.to_rfc3339());
        }
        if let Some(until) = filter.until {
            query = query.where_op("created_at", CompareOp::Lte, until.to_rfc3339());
        }
        if let Some(customer_id) = &filter.customer_id {
            query = query.where_eq("customer.id", customer_id.as_str());
        }
        if let Some(seller_id) = &filter.seller_id {
            query = query.where_eq("seller_id", seller_id.as_str());
        }
        query = query.order_by("created_at", Direction::Desc);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        Ok(self.store.query_records(query).await?)
    }
}
