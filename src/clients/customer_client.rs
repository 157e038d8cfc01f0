use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::ActivityClient;
use crate::customers::{digits_only, CustomerCreate, CustomerError};
use crate::domain::{ActivityKind, Customer, Permission, Session};
use crate::store::{encode, Direction, Query, Record, StoreClient, StoreError};

#[derive(Clone)]
pub struct CustomerClient {
    store: StoreClient,
    activity: ActivityClient,
    max_attempts: u32,
}

impl_record_reads!(CustomerClient, Customer, CustomerError, customer);

#[derive(Serialize)]
struct PurchaseTotals {
    total_purchases: u32,
    total_spent: Decimal,
    last_purchase_at: DateTime<Utc>,
}

impl CustomerClient {
    pub fn new(store: StoreClient, activity: ActivityClient, max_attempts: u32) -> Self {
        Self {
            store,
            activity,
            max_attempts,
        }
    }

    #[instrument(skip(self, session, create), fields(name = %create.name))]
    pub async fn register_customer(&self, session: &Session, create: CustomerCreate) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        session.require(Permission::ManageCustomers)?;

        let customer = self.store.insert(&create.into_customer(&session.user_id)).await?;
        info!(customer_id = %customer.id, "Customer registered");
        self.activity
            .log(
                session,
                ActivityKind::CustomerRegistered,
                json!({ "customer_id": customer.id, "name": customer.name }),
            )
            .await;
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn list_customers(&self, limit: Option<usize>) -> Result<Vec<Customer>, CustomerError> {
        debug!("Sending request");
        let mut query = Query::collection(Customer::COLLECTION).order_by("name", Direction::Asc);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(self.store.query_records(query).await?)
    }

    /// Case-insensitive substring match over name and email. Terms carrying
    /// digits are also matched against the phone number, ignoring punctuation.
    #[instrument(skip(self))]
    pub async fn search_customers(&self, term: &str) -> Result<Vec<Customer>, CustomerError> {
        let needle = term.trim().to_lowercase();
        let digits = digits_only(term);
        let customers = self.list_customers(None).await?;
        if needle.is_empty() {
            return Ok(customers);
        }
        Ok(customers
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&needle))
                    || (!digits.is_empty() && c.phone.contains(&digits))
            })
            .collect())
    }

    /// Folds one purchase into the customer's aggregates.
    ///
    /// Runs as a transaction so concurrent purchases by the same customer
    /// are never lost. Does not deduplicate: each call counts one purchase.
    #[instrument(skip(self))]
    pub async fn record_purchase(
        &self,
        customer_id: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        let customer = self
            .store
            .run_transaction(self.max_attempts, |tx| {
                let customer_id = customer_id.to_string();
                Box::pin(async move {
                    let mut customer: Customer = tx
                        .get_record(&customer_id)
                        .await?
                        .ok_or_else(|| CustomerError::NotFound(customer_id.clone()))?;
                    customer.apply_purchase(amount, at);
                    let totals = PurchaseTotals {
                        total_purchases: customer.total_purchases,
                        total_spent: customer.total_spent,
                        last_purchase_at: at,
                    };
                    let patch = encode(Customer::COLLECTION, &totals).map_err(StoreError::from)?;
                    tx.update(Customer::COLLECTION, &customer_id, patch);
                    Ok::<_, CustomerError>(customer)
                })
            })
            .await?;
        info!(
            total_purchases = customer.total_purchases,
            total_spent = %customer.total_spent,
            "Purchase recorded"
        );
        Ok(customer)
    }
}
