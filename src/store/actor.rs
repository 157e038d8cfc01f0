use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::client::StoreClient;
use super::document::{merge, Document, DocumentKey, VersionedDocument};
use super::error::StoreError;
use super::feed::{StoreEvent, FEED_CAPACITY};
use super::query::Query;

pub type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// The version a transaction records for a document it found absent.
pub const ABSENT: u64 = 0;

/// A document version observed by a transaction and re-checked at commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadStamp {
    pub key: DocumentKey,
    pub version: u64,
}

/// A buffered transaction write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Set { key: DocumentKey, data: Document },
    Update { key: DocumentKey, patch: Document },
}

impl Write {
    pub fn key(&self) -> &DocumentKey {
        match self {
            Write::Set { key, .. } | Write::Update { key, .. } => key,
        }
    }
}

#[derive(Debug)]
pub enum StoreRequest {
    Get {
        collection: String,
        id: String,
        respond_to: Reply<Option<VersionedDocument>>,
    },
    Query {
        query: Query,
        respond_to: Reply<Vec<VersionedDocument>>,
    },
    Add {
        collection: String,
        data: Document,
        respond_to: Reply<String>,
    },
    Set {
        collection: String,
        id: String,
        data: Document,
        respond_to: Reply<u64>,
    },
    Update {
        collection: String,
        id: String,
        patch: Document,
        respond_to: Reply<u64>,
    },
    Delete {
        collection: String,
        id: String,
        respond_to: Reply<()>,
    },
    Commit {
        reads: Vec<ReadStamp>,
        writes: Vec<Write>,
        respond_to: Reply<()>,
    },
    Subscribe {
        respond_to: Reply<broadcast::Receiver<StoreEvent>>,
    },
}

struct StoredDocument {
    version: u64,
    data: Document,
}

/// In-memory document store served by a single task.
///
/// Requests are handled one at a time, which is what makes `Commit` atomic:
/// the version check and every write happen without another request in
/// between. The actor stops once every `StoreClient` has been dropped, which
/// also ends every subscription.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    collections: HashMap<String, HashMap<String, StoredDocument>>,
    clock: u64,
    next_id_fn: Box<dyn Fn() -> String + Send + Sync>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreActor {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> String + Send + Sync + 'static,
    ) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        let actor = Self {
            receiver,
            collections: HashMap::new(),
            clock: 0,
            next_id_fn: Box::new(next_id_fn),
            events,
        };
        (actor, StoreClient::new(sender))
    }

    #[instrument(name = "store_actor", skip(self))]
    pub async fn run(mut self) {
        info!("StoreActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Get { collection, id, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_get(&collection, &id)));
                }
                StoreRequest::Query { query, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_query(&query)));
                }
                StoreRequest::Add { collection, data, respond_to } => {
                    let id = (self.next_id_fn)();
                    self.write(&collection, &id, data);
                    debug!(collection = %collection, id = %id, "Document added");
                    let _ = respond_to.send(Ok(id));
                }
                StoreRequest::Set { collection, id, data, respond_to } => {
                    let version = self.write(&collection, &id, data);
                    let _ = respond_to.send(Ok(version));
                }
                StoreRequest::Update { collection, id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(&collection, &id, &patch));
                }
                StoreRequest::Delete { collection, id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(&collection, &id));
                }
                StoreRequest::Commit { reads, writes, respond_to } => {
                    let _ = respond_to.send(self.handle_commit(reads, writes));
                }
                StoreRequest::Subscribe { respond_to } => {
                    debug!(subscribers = self.events.receiver_count() + 1, "Subscriber added");
                    let _ = respond_to.send(Ok(self.events.subscribe()));
                }
            }
        }
        info!("StoreActor stopped");
    }

    fn handle_get(&self, collection: &str, id: &str) -> Option<VersionedDocument> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| VersionedDocument {
                id: id.to_string(),
                version: stored.version,
                data: stored.data.clone(),
            })
    }

    fn handle_query(&self, query: &Query) -> Vec<VersionedDocument> {
        let candidates = self
            .collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, stored)| VersionedDocument {
                        id: id.clone(),
                        version: stored.version,
                        data: stored.data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.apply(candidates)
    }

    fn handle_update(&mut self, collection: &str, id: &str, patch: &Document) -> Result<u64, StoreError> {
        let version = self.tick();
        let stored = self
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        merge(&mut stored.data, patch);
        stored.version = version;
        self.publish(collection, id);
        Ok(version)
    }

    fn handle_delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        self.publish(collection, id);
        Ok(())
    }

    #[instrument(skip(self, reads, writes), fields(reads = reads.len(), writes = writes.len()))]
    fn handle_commit(&mut self, reads: Vec<ReadStamp>, writes: Vec<Write>) -> Result<(), StoreError> {
        for stamp in &reads {
            if self.current_version(&stamp.key) != stamp.version {
                warn!(collection = %stamp.key.collection, id = %stamp.key.id, "Commit rejected: stale read");
                return Err(StoreError::Conflict {
                    collection: stamp.key.collection.clone(),
                    id: stamp.key.id.clone(),
                });
            }
        }

        // Every update must target a document that exists by the time it is
        // applied (either already stored or set earlier in this commit).
        let mut created: Vec<&DocumentKey> = Vec::new();
        for write in &writes {
            match write {
                Write::Set { key, .. } => created.push(key),
                Write::Update { key, .. } => {
                    if self.current_version(key) == ABSENT && !created.contains(&key) {
                        return Err(StoreError::not_found(&key.collection, &key.id));
                    }
                }
            }
        }

        let count = writes.len();
        for write in writes {
            match write {
                Write::Set { key, data } => {
                    self.write(&key.collection, &key.id, data);
                }
                Write::Update { key, patch } => {
                    self.handle_update(&key.collection, &key.id, &patch)?;
                }
            }
        }
        debug!(writes = count, "Commit applied");
        Ok(())
    }

    fn current_version(&self, key: &DocumentKey) -> u64 {
        self.collections
            .get(&key.collection)
            .and_then(|docs| docs.get(&key.id))
            .map(|stored| stored.version)
            .unwrap_or(ABSENT)
    }

    fn write(&mut self, collection: &str, id: &str, data: Document) -> u64 {
        let version = self.tick();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), StoredDocument { version, data });
        self.publish(collection, id);
        version
    }

    /// Announces an applied write. Having no subscribers is not an error.
    fn publish(&self, collection: &str, id: &str) {
        let _ = self.events.send(StoreEvent {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
