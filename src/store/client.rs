use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, instrument, warn};

use super::actor::{ReadStamp, Reply, StoreRequest, Write};
use super::document::{Document, Record, VersionedDocument};
use super::error::StoreError;
use super::feed::{StoreEvent, Subscription};
use super::query::Query;
use super::transaction::Transaction;

/// Cloneable handle to the document store.
#[derive(Clone, Debug)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> StoreRequest) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| StoreError::Unavailable("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::Unavailable("Actor dropped".to_string()))?
    }

    #[instrument(skip(self))]
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<VersionedDocument>, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Get {
            collection: collection.to_string(),
            id: id.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    pub async fn query(&self, query: Query) -> Result<Vec<VersionedDocument>, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Query { query, respond_to }).await
    }

    #[instrument(skip(self, data))]
    pub async fn add(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Add {
            collection: collection.to_string(),
            data,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, data))]
    pub async fn set(&self, collection: &str, id: &str, data: Document) -> Result<u64, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<u64, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, reads, writes), fields(reads = reads.len(), writes = writes.len()))]
    pub async fn commit(&self, reads: Vec<ReadStamp>, writes: Vec<Write>) -> Result<(), StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Commit { reads, writes, respond_to }).await
    }

    /// Raw feed of every write applied from now on.
    #[instrument(skip(self))]
    pub async fn events(&self) -> Result<broadcast::Receiver<StoreEvent>, StoreError> {
        debug!("Sending request");
        self.call(|respond_to| StoreRequest::Subscribe { respond_to }).await
    }

    /// Keeps `query` live: see [`Subscription`].
    pub async fn subscribe<R: Record>(&self, query: Query) -> Result<Subscription<R>, StoreError> {
        let events = self.events().await?;
        Ok(Subscription::new(self.sender.downgrade(), query, events))
    }

    pub async fn get_record<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        match self.get(R::COLLECTION, id).await? {
            Some(doc) => Ok(Some(R::from_document(&doc.id, &doc.data)?)),
            None => Ok(None),
        }
    }

    pub async fn query_records<R: Record>(&self, query: Query) -> Result<Vec<R>, StoreError> {
        self.query(query)
            .await?
            .iter()
            .map(|doc| R::from_document(&doc.id, &doc.data).map_err(StoreError::from))
            .collect()
    }

    /// Stores a new record under a store-generated id and returns it with that id.
    pub async fn insert<R: Record>(&self, record: &R) -> Result<R, StoreError> {
        let data = record.to_document()?;
        let id = self.add(R::COLLECTION, data.clone()).await?;
        Ok(R::from_document(&id, &data)?)
    }

    /// Runs `f` as an optimistic transaction.
    ///
    /// `f` is re-run from scratch with a fresh [`Transaction`] whenever the
    /// commit loses a race, up to `max_attempts` times. It must therefore be
    /// free of side effects outside the transaction handle. An `Err` from `f`
    /// aborts without writing anything.
    pub async fn run_transaction<T, E, F>(&self, max_attempts: u32, mut f: F) -> Result<T, E>
    where
        F: for<'t> FnMut(&'t mut Transaction) -> BoxFuture<'t, Result<T, E>>,
        E: From<StoreError>,
    {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let mut tx = Transaction::new(self.clone());
            let value = f(&mut tx).await?;
            match tx.commit().await {
                Ok(()) => return Ok(value),
                Err(StoreError::Conflict { collection, id }) => {
                    debug!(attempt, collection = %collection, id = %id, "Transaction conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(attempts = max_attempts, "Transaction abandoned under contention");
        Err(StoreError::Contention { attempts: max_attempts }.into())
    }
}
