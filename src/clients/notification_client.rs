use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{Notification, Priority};
use crate::notifications::{NotificationError, LIST_LIMIT};
use crate::store::{encode, Direction, Query, Record, StoreClient, StoreError, Subscription};

/// Client for the notification sink.
#[derive(Clone)]
pub struct NotificationClient {
    store: StoreClient,
}

impl_record_reads!(NotificationClient, Notification, NotificationError, notification);

#[derive(Serialize)]
struct ReadPatch {
    read: bool,
    read_at: DateTime<Utc>,
}

impl NotificationClient {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Records a low-stock alert. Never deduplicates: every trigger adds a
    /// new notification, even if an unread one for the product exists.
    #[instrument(skip(self, product_name))]
    pub async fn emit_low_stock(
        &self,
        owner: &str,
        product_id: &str,
        product_name: &str,
        current_stock: u32,
        priority: Priority,
    ) -> Result<Notification, NotificationError> {
        debug!("Sending request");
        let alert = Notification::low_stock(owner, product_id, product_name, current_stock, priority);
        let stored = self.store.insert(&alert).await?;
        info!(notification_id = %stored.id, ?priority, current_stock, "Low-stock notification created");
        Ok(stored)
    }

    /// Newest first, capped at [`LIST_LIMIT`].
    #[instrument(skip(self))]
    pub async fn list_notifications(
        &self,
        owner: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError> {
        debug!("Sending request");
        Ok(self.store.query_records(inbox(owner, unread_only)).await?)
    }

    /// Live unread inbox for `owner`, in the same order and with the same
    /// cap as [`list_notifications`](Self::list_notifications).
    #[instrument(skip(self))]
    pub async fn subscribe(&self, owner: &str) -> Result<Subscription<Notification>, NotificationError> {
        debug!("Sending request");
        Ok(self.store.subscribe(inbox(owner, true)).await?)
    }

    /// Marks a notification read. Repeating the call changes nothing.
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, id: &str) -> Result<Notification, NotificationError> {
        let mut notification = self.require_notification(id).await?;
        if notification.read {
            debug!("Notification already read");
            return Ok(notification);
        }
        let patch = ReadPatch {
            read: true,
            read_at: Utc::now(),
        };
        let data = encode(Notification::COLLECTION, &patch).map_err(StoreError::from)?;
        self.store.update(Notification::COLLECTION, id, data).await?;
        notification.read = true;
        notification.read_at = Some(patch.read_at);
        info!("Notification marked as read");
        Ok(notification)
    }
}

fn inbox(owner: &str, unread_only: bool) -> Query {
    let mut query = Query::collection(Notification::COLLECTION).where_eq("owner", owner);
    if unread_only {
        query = query.where_eq("read", false);
    }
    query.order_by("created_at", Direction::Desc).limit(LIST_LIMIT)
}
