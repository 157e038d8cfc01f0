use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::RecordError;

/// A schemaless document body as held by the store.
pub type Document = Map<String, Value>;

/// A stored document together with the version it was read at.
///
/// Versions are assigned by the store on every write and are never reused, so
/// a version observed by a transaction pins the exact document body it saw.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    pub id: String,
    pub version: u64,
    pub data: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Trait every typed record stored in a collection implements.
///
/// Records are decoded through `serde` and then validated, so a malformed or
/// out-of-range document is rejected here instead of leaking into the domain.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the collection the record lives in.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Checks invariants serde cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Decodes and validates a stored document.
    fn from_document(id: &str, data: &Document) -> Result<Self, RecordError> {
        let mut body = data.clone();
        body.insert("id".to_string(), Value::String(id.to_string()));
        let record: Self =
            serde_json::from_value(Value::Object(body)).map_err(|e| RecordError::Invalid {
                collection: Self::COLLECTION.to_string(),
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        record.validate().map_err(|reason| RecordError::Invalid {
            collection: Self::COLLECTION.to_string(),
            id: id.to_string(),
            reason,
        })?;
        Ok(record)
    }

    /// Validates the record and encodes it without its id (the id is the key).
    fn to_document(&self) -> Result<Document, RecordError> {
        self.validate().map_err(|reason| RecordError::Invalid {
            collection: Self::COLLECTION.to_string(),
            id: self.id().to_string(),
            reason,
        })?;
        let mut body = encode(Self::COLLECTION, self)?;
        body.remove("id");
        Ok(body)
    }
}

/// Encodes any serializable struct as a document (used for partial updates).
pub fn encode<T: Serialize + ?Sized>(collection: &str, value: &T) -> Result<Document, RecordError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(other) => Err(RecordError::Encode {
            collection: collection.to_string(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(RecordError::Encode {
            collection: collection.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Shallow merge of `patch` into `target`.
pub fn merge(target: &mut Document, patch: &Document) {
    for (field, value) in patch {
        target.insert(field.clone(), value.clone());
    }
}
