use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use super::actor::{ReadStamp, Write, ABSENT};
use super::client::StoreClient;
use super::document::{merge, Document, DocumentKey, Record};
use super::error::StoreError;

/// Transaction-scoped read and write handle.
///
/// Reads go to the store and record the version they saw; writes are
/// buffered and only sent at commit, together with those versions. Reads of
/// a document this transaction already wrote return the buffered body.
pub struct Transaction {
    client: StoreClient,
    reads: HashMap<DocumentKey, u64>,
    view: HashMap<DocumentKey, Option<Document>>,
    writes: Vec<Write>,
}

impl Transaction {
    pub(crate) fn new(client: StoreClient) -> Self {
        Self {
            client,
            reads: HashMap::new(),
            view: HashMap::new(),
            writes: Vec::new(),
        }
    }

    pub async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let key = DocumentKey::new(collection, id);
        if let Some(known) = self.view.get(&key) {
            return Ok(known.clone());
        }
        let found = self.client.get(collection, id).await?;
        let version = found.as_ref().map(|d| d.version).unwrap_or(ABSENT);
        let data = found.map(|d| d.data);
        self.reads.insert(key.clone(), version);
        self.view.insert(key, data.clone());
        Ok(data)
    }

    pub async fn get_record<R: Record>(&mut self, id: &str) -> Result<Option<R>, StoreError> {
        match self.get(R::COLLECTION, id).await? {
            Some(data) => Ok(Some(R::from_document(id, &data)?)),
            None => Ok(None),
        }
    }

    pub fn set(&mut self, collection: &str, id: &str, data: Document) {
        let key = DocumentKey::new(collection, id);
        self.view.insert(key.clone(), Some(data.clone()));
        self.writes.push(Write::Set { key, data });
    }

    pub fn set_record<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let data = record.to_document()?;
        self.set(R::COLLECTION, record.id(), data);
        Ok(())
    }

    /// Buffers a shallow merge into an existing document.
    pub fn update(&mut self, collection: &str, id: &str, patch: Document) {
        let key = DocumentKey::new(collection, id);
        if let Some(Some(current)) = self.view.get_mut(&key) {
            merge(current, &patch);
        }
        self.writes.push(Write::Update { key, patch });
    }

    /// Buffers a new document under a freshly generated id.
    pub fn create(&mut self, collection: &str, data: Document) -> String {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, data);
        id
    }

    pub(crate) async fn commit(self) -> Result<(), StoreError> {
        let reads = self
            .reads
            .into_iter()
            .map(|(key, version)| ReadStamp { key, version })
            .collect();
        self.client.commit(reads, self.writes).await
    }
}

/// Reads a string field out of a document body.
pub fn field_str<'a>(data: &'a Document, field: &str) -> Option<&'a str> {
    data.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreActor;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn body(value: Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    fn start() -> StoreClient {
        let (actor, client) = StoreActor::new(16, || Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let client = start();
        client.set("bins", "b1", body(json!({"count": 4}))).await.unwrap();

        let seen: Result<(Option<Document>, Option<Document>), StoreError> = client
            .run_transaction(3, |tx| {
                Box::pin(async move {
                    tx.get("bins", "b1").await?;
                    tx.update("bins", "b1", body(json!({"count": 1})));
                    let created = tx.create("bins", body(json!({"count": 9})));
                    Ok((tx.get("bins", "b1").await?, tx.get("bins", &created).await?))
                })
            })
            .await;
        let (updated, created) = seen.unwrap();
        assert_eq!(updated.unwrap().get("count"), Some(&json!(1)));
        assert_eq!(created.unwrap().get("count"), Some(&json!(9)));

        let stored = client.get("bins", "b1").await.unwrap().unwrap();
        assert_eq!(stored.data.get("count"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_transaction_retries_after_conflicting_write() {
        let client = start();
        client.set("bins", "b1", body(json!({"count": 4}))).await.unwrap();

        let attempts = Arc::new(AtomicU32::new(0));
        let outside = client.clone();
        let result: Result<i64, StoreError> = client
            .run_transaction(5, |tx| {
                let attempts = attempts.clone();
                let outside = outside.clone();
                Box::pin(async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    let data = tx.get("bins", "b1").await?.unwrap_or_default();
                    let count = data.get("count").and_then(Value::as_i64).unwrap_or(0);
                    if n == 0 {
                        // A competing writer slips in between our read and commit.
                        outside.update("bins", "b1", body(json!({"count": 10}))).await?;
                    }
                    tx.update("bins", "b1", body(json!({"count": count + 1})));
                    Ok(count + 1)
                })
            })
            .await;

        assert_eq!(result, Ok(11));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let stored = client.get("bins", "b1").await.unwrap().unwrap();
        assert_eq!(stored.data.get("count"), Some(&json!(11)));
    }

    #[tokio::test]
    async fn test_transaction_abort_writes_nothing() {
        let client = start();
        let result: Result<(), StoreError> = client
            .run_transaction(3, |tx| {
                Box::pin(async move {
                    tx.set("bins", "b2", body(json!({"count": 1})));
                    Err(StoreError::not_found("bins", "b0"))
                })
            })
            .await;
        assert!(result.is_err());
        assert!(client.get("bins", "b2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transaction_gives_up_under_constant_contention() {
        let client = start();
        client.set("bins", "b1", body(json!({"count": 0}))).await.unwrap();
        let outside = client.clone();

        let result: Result<(), StoreError> = client
            .run_transaction(3, |tx| {
                let outside = outside.clone();
                Box::pin(async move {
                    tx.get("bins", "b1").await?;
                    outside.update("bins", "b1", body(json!({"count": 1}))).await?;
                    tx.update("bins", "b1", body(json!({"count": 2})));
                    Ok(())
                })
            })
            .await;
        assert_eq!(result, Err(StoreError::Contention { attempts: 3 }));
    }
}
