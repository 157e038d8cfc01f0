//! Document store adapter: an in-memory, actor-backed store of schemaless
//! documents grouped in named collections, with optimistic transactions.

mod actor;
mod client;
mod document;
mod error;
mod feed;
mod query;
mod transaction;

pub use actor::{ReadStamp, Reply, StoreActor, StoreRequest, Write, ABSENT};
pub use client::StoreClient;
pub use document::{encode, merge, Document, DocumentKey, Record, VersionedDocument};
pub use error::{RecordError, StoreError};
pub use feed::{StoreEvent, Subscription, FEED_CAPACITY};
pub use query::{compare_values, CompareOp, Direction, Filter, OrderBy, Query};
pub use transaction::{field_str, Transaction};
