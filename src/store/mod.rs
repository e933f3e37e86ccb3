// 🗄️ Document Store - Collection-scoped CRUD with store-assigned ids
//
// The tag registry only ever talks to this trait. Stores are constructed
// explicitly and injected, never reached through a global handle.
//
// Implementations:
// - MemoryStore: in-process maps, for tests and ephemeral sessions
// - SqliteStore: one SQLite file, JSON-encoded documents

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::StoreResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Opaque document identifier assigned by the store
pub type DocumentId = String;

/// Field map of one document
pub type Fields = Map<String, Value>;

/// A document as returned by `list`
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// Fields for a document about to be created
///
/// Fields named in `server_timestamps` are filled in by the store with its
/// own clock at write time, overriding anything the caller put there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub fields: Fields,
    pub server_timestamps: Vec<String>,
}

impl NewDocument {
    pub fn new(fields: Fields) -> Self {
        NewDocument {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }

    /// Resolve server timestamps against `now`
    pub(crate) fn into_fields(self, now: DateTime<Utc>) -> Fields {
        let NewDocument {
            mut fields,
            server_timestamps,
        } = self;
        let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true));
        for field in server_timestamps {
            fields.insert(field, stamp.clone());
        }
        fields
    }
}

/// Generic document store addressed by collection name and document id
///
/// Every call is independent; the store's own consistency model is all the
/// coordination callers get.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document under a freshly generated unique id
    async fn create(&self, collection: &str, document: NewDocument) -> StoreResult<DocumentId>;

    /// Merge `fields` into a document, creating it if it does not exist
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Fetch a document's fields, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Fields>>;

    /// Remove a document; removing an absent document succeeds
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// All documents in a collection, in store-defined order
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;
}

pub(crate) fn generate_id() -> DocumentId {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_server_timestamps_override_caller_fields() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Rent"));
        fields.insert("createdAt".to_string(), json!("forged"));

        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let resolved = NewDocument::new(fields)
            .with_server_timestamp("createdAt")
            .into_fields(now);

        assert_eq!(resolved["name"], json!("Rent"));
        assert_eq!(resolved["createdAt"], json!("2024-03-15T09:30:00.000000Z"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
