//! # Mock Framework
//!
//! Utilities for testing clients without a running [`StoreActor`](crate::store::StoreActor).
//!
//! Use [`create_mock_store`] to get a `StoreClient` and the receiving end of
//! its channel. Then use helpers like [`expect_get`] or [`expect_commit`] to
//! inspect each request and answer it, including with failures the real
//! store would rarely produce.

use tokio::sync::mpsc;

use crate::store::{Document, Query, ReadStamp, Reply, StoreClient, StoreRequest, VersionedDocument, Write};

/// Creates a store client wired to a receiver the test controls.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Next message must be a Get; yields `(collection, id, reply)`.
pub async fn expect_get(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, String, Reply<Option<VersionedDocument>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Get { collection, id, respond_to }) => Some((collection, id, respond_to)),
        _ => None,
    }
}

pub async fn expect_query(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Query, Reply<Vec<VersionedDocument>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Query { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

/// Next message must be an Add; yields `(collection, data, reply)`.
pub async fn expect_add(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Document, Reply<String>)> {
    match receiver.recv().await {
        Some(StoreRequest::Add { collection, data, respond_to }) => Some((collection, data, respond_to)),
        _ => None,
    }
}

pub async fn expect_update(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, String, Document, Reply<u64>)> {
    match receiver.recv().await {
        Some(StoreRequest::Update {
            collection,
            id,
            patch,
            respond_to,
        }) => Some((collection, id, patch, respond_to)),
        _ => None,
    }
}

/// Next message must be a Commit; yields `(reads, writes, reply)`.
pub async fn expect_commit(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Vec<ReadStamp>, Vec<Write>, Reply<()>)> {
    match receiver.recv().await {
        Some(StoreRequest::Commit { reads, writes, respond_to }) => Some((reads, writes, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_store() {
        let (client, mut receiver) = create_mock_store(10);

        let get_task = tokio::spawn(async move { client.get("products", "p1").await });

        let (collection, id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!((collection.as_str(), id.as_str()), ("products", "p1"));
        responder
            .send(Ok(Some(VersionedDocument {
                id: "p1".to_string(),
                version: 3,
                data: json!({"name": "Drill"}).as_object().cloned().unwrap(),
            })))
            .unwrap();

        let found = get_task.await.unwrap().unwrap().unwrap();
        assert_eq!(found.version, 3);
    }

    #[tokio::test]
    async fn test_mock_store_surfaces_failures() {
        let (client, mut receiver) = create_mock_store(10);

        let add_task = tokio::spawn(async move { client.add("notifications", Document::new()).await });

        let (_, _, responder) = expect_add(&mut receiver).await.expect("Expected Add request");
        responder.send(Err(StoreError::Unavailable("disk full".into()))).unwrap();

        assert_eq!(
            add_task.await.unwrap(),
            Err(StoreError::Unavailable("disk full".into()))
        );
    }
}
