use thiserror::Error;

/// Errors raised by the document store and its transactions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("Transaction conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },
    #[error("Transaction abandoned after {attempts} conflicting attempts")]
    Contention { attempts: u32 },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// A document that could not be turned into (or out of) a typed record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("Invalid {collection} record {id}: {reason}")]
    Invalid {
        collection: String,
        id: String,
        reason: String,
    },
    #[error("Could not encode {collection} record: {reason}")]
    Encode { collection: String, reason: String },
}
