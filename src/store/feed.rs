use std::marker::PhantomData;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::actor::StoreRequest;
use super::client::StoreClient;
use super::document::Record;
use super::error::StoreError;
use super::query::Query;

/// How many unread change events a subscriber may fall behind by before it
/// starts skipping them.
pub const FEED_CAPACITY: usize = 256;

/// A write the store has applied to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub collection: String,
    pub id: String,
}

/// A live view over the results of one query.
///
/// The first [`next`](Subscription::next) yields the current results. Every
/// later call waits for a write to the queried collection and yields the
/// query re-run. Events that queue up while the subscriber is busy collapse
/// into a single refresh. Returns `None` once the store has stopped.
///
/// A subscription does not keep the store running on its own.
pub struct Subscription<R> {
    store: mpsc::WeakSender<StoreRequest>,
    query: Query,
    events: broadcast::Receiver<StoreEvent>,
    primed: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Subscription<R> {
    pub(crate) fn new(
        store: mpsc::WeakSender<StoreRequest>,
        query: Query,
        events: broadcast::Receiver<StoreEvent>,
    ) -> Self {
        Self {
            store,
            query,
            events,
            primed: false,
            _record: PhantomData,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub async fn next(&mut self) -> Option<Result<Vec<R>, StoreError>> {
        if self.primed {
            self.wait_for_change().await?;
        }
        self.primed = true;
        let store = StoreClient::new(self.store.upgrade()?);
        Some(store.query_records(self.query.clone()).await)
    }

    async fn wait_for_change(&mut self) -> Option<()> {
        loop {
            match self.events.recv().await {
                Ok(event) if event.collection == self.query.collection => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, collection = %self.query.collection, "Subscriber lagged, refreshing");
                    break;
                }
                Err(RecvError::Closed) => return None,
            }
        }
        // The re-run query covers anything already queued.
        let mut drained = 0usize;
        loop {
            match self.events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => drained += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if drained > 0 {
            debug!(drained, "Coalesced queued change events");
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;
    use crate::store::{Document, StoreActor};
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    fn start() -> (StoreActor, StoreClient) {
        StoreActor::new(16, || Uuid::new_v4().to_string())
    }

    async fn put(store: &StoreClient, id: &str, category: &str) {
        let product = Product::new(id, id.to_uppercase(), category, Decimal::ONE, 3);
        store
            .set(Product::COLLECTION, id, product.to_document().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subscription_yields_snapshot_then_refreshes() {
        let (actor, store) = start();
        tokio::spawn(actor.run());
        put(&store, "p1", "tools").await;

        let query = Query::collection(Product::COLLECTION).where_eq("category", "tools");
        let mut feed = store.subscribe::<Product>(query).await.unwrap();
        let first = feed.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // Writes elsewhere do not wake the subscriber.
        store.set("shelves", "s1", Document::new()).await.unwrap();
        assert!(timeout(Duration::from_millis(50), feed.next()).await.is_err());

        put(&store, "p2", "tools").await;
        put(&store, "p3", "paint").await;
        let refreshed = feed.next().await.unwrap().unwrap();
        let ids: Vec<_> = refreshed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_subscription_ends_with_the_store() {
        let (actor, store) = start();
        let handle = tokio::spawn(actor.run());
        let mut feed = store
            .subscribe::<Product>(Query::collection(Product::COLLECTION))
            .await
            .unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        drop(store);
        handle.await.unwrap();
        assert!(feed.next().await.is_none());
    }
}
