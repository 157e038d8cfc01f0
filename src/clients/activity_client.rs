use chrono::Utc;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::{Activity, ActivityKind, Session};
use crate::store::{Direction, Query, Record, StoreClient, StoreError};

/// Append-only audit trail. Writes are best effort: a failed entry is
/// logged and dropped, never surfaced to the operation that caused it.
#[derive(Clone)]
pub struct ActivityClient {
    store: StoreClient,
}

impl ActivityClient {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    #[instrument(skip(self, session, details), fields(actor = %session.user_id))]
    pub async fn log(&self, session: &Session, kind: ActivityKind, details: Value) {
        debug!("Sending request");
        let entry = Activity {
            id: String::new(),
            kind,
            actor_id: session.user_id.clone(),
            actor_email: session.email.clone(),
            details,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.store.insert(&entry).await {
            warn!(error = %e, ?kind, "Activity entry dropped");
        }
    }

    /// Most recent entries first.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: usize) -> Result<Vec<Activity>, StoreError> {
        debug!("Sending request");
        self.store
            .query_records(
                Query::collection(Activity::COLLECTION)
                    .order_by("timestamp", Direction::Desc)
                    .limit(limit),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::store::StoreActor;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_log_records_actor_and_details() {
        let (actor, store) = StoreActor::new(16, || Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        let client = ActivityClient::new(store);
        let session = Session::new("u1", "ana@shop.test", Role::Seller);

        client.log(&session, ActivityKind::SaleCreated, json!({"total": "200"})).await;

        let entries = client.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ActivityKind::SaleCreated);
        assert_eq!(entries[0].actor_email, "ana@shop.test");
        assert_eq!(entries[0].details["total"], "200");
    }

    #[tokio::test]
    async fn test_log_swallows_store_failures() {
        let (actor, store) = StoreActor::new(16, || Uuid::new_v4().to_string());
        drop(actor);
        let client = ActivityClient::new(store);
        let session = Session::new("u1", "ana@shop.test", Role::Seller);

        // Returns unit even though the store is gone.
        client.log(&session, ActivityKind::ProductDeleted, Value::Null).await;
        assert!(client.recent(1).await.is_err());
    }
}
