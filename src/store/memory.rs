// In-memory DocumentStore
//
// Collections keep insertion order, so `list` returns documents oldest first.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{generate_id, Document, DocumentId, DocumentStore, Fields, NewDocument};
use crate::cycle::{Clock, SystemClock};
use crate::error::StoreResult;

#[derive(Debug, Default)]
struct Collection {
    order: Vec<DocumentId>,
    docs: HashMap<DocumentId, Fields>,
}

impl Collection {
    fn insert(&mut self, id: DocumentId, fields: Fields) {
        if !self.docs.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.docs.insert(id, fields);
    }
}

/// Document store held entirely in process memory
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Server timestamps come from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryStore {
            clock,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.docs.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, document: NewDocument) -> StoreResult<DocumentId> {
        let fields = document.into_fields(self.clock.now());
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = generate_id();
        while docs.docs.contains_key(&id) {
            id = generate_id();
        }
        docs.insert(id.clone(), fields);

        tracing::debug!(collection, id = %id, "memory store: created document");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut merged = docs.docs.get(id).cloned().unwrap_or_default();
        merged.extend(fields);
        docs.insert(id.to_string(), merged);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Fields>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            if docs.docs.remove(id).is_some() {
                docs.order.retain(|existing| existing != id);
            }
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .order
            .iter()
            .filter_map(|id| {
                docs.docs.get(id).map(|fields| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let store = MemoryStore::new();
        let id = store
            .create("tags", NewDocument::new(fields(&[("name", json!("Food"))])))
            .await
            .unwrap();

        let found = store.get("tags", &id).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("Food"));

        store.delete("tags", &id).await.unwrap();
        assert!(store.get("tags", &id).await.unwrap().is_none());
        assert_eq!(store.len("tags").await, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        store.delete("tags", "nope").await.unwrap();
        store.delete("never-created", "nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        let id = store.create("tags", NewDocument::default()).await.unwrap();

        assert!(store.get("expenses", &id).await.unwrap().is_none());
        assert!(store.list("expenses").await.unwrap().is_empty());
        assert_eq!(store.list("tags").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let doc = NewDocument::new(fields(&[("name", json!(name))]));
            ids.push(store.create("tags", doc).await.unwrap());
        }
        store.delete("tags", &ids[1]).await.unwrap();

        let listed: Vec<_> = store
            .list("tags")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(listed, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
    }

    #[tokio::test]
    async fn test_set_merges_and_upserts() {
        let store = MemoryStore::new();
        let id = store
            .create(
                "tags",
                NewDocument::new(fields(&[("name", json!("Food")), ("color", json!("red"))])),
            )
            .await
            .unwrap();

        store
            .set("tags", &id, fields(&[("color", json!("blue"))]))
            .await
            .unwrap();
        let merged = store.get("tags", &id).await.unwrap().unwrap();
        assert_eq!(merged["name"], json!("Food"));
        assert_eq!(merged["color"], json!("blue"));

        store
            .set("tags", "chosen-id", fields(&[("name", json!("Rent"))]))
            .await
            .unwrap();
        assert!(store.get("tags", "chosen-id").await.unwrap().is_some());
        assert_eq!(store.len("tags").await, 2);
    }

    #[tokio::test]
    async fn test_server_timestamp_uses_store_clock() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let store = MemoryStore::with_clock(Arc::new(ManualClock::new(now)));

        let id = store
            .create("tags", NewDocument::default().with_server_timestamp("createdAt"))
            .await
            .unwrap();

        let doc = store.get("tags", &id).await.unwrap().unwrap();
        assert_eq!(doc["createdAt"], json!("2024-06-01T08:00:00.000000Z"));
    }
}
