// 🏷️ Tag Entity - User-defined labels for expenses and gains
//
// "The id is IDENTITY (assigned by the store, never changes), everything else is VALUE"
//
// Tags are immutable once created: there is create, read, list and delete,
// but no update. A deleted tag is gone (no tombstone).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{StoreError, TagError, TagResult};
use crate::store::{DocumentId, DocumentStore, Fields, NewDocument};

/// Collection every tag lives in
pub const TAGS_COLLECTION: &str = "tags";

// ============================================================================
// USAGE TYPE
// ============================================================================

/// Which financial flow a tag applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    /// Money going out
    Expense,

    /// Money coming in
    Gain,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::Expense => "expense",
            UsageType::Gain => "gain",
        }
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageType {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(UsageType::Expense),
            "gain" => Ok(UsageType::Gain),
            other => Err(TagError::InvalidInput(format!(
                "usage type must be \"expense\" or \"gain\", got {:?}",
                other
            ))),
        }
    }
}

// ============================================================================
// TAG
// ============================================================================

/// Stored attributes of a tag (the id is the document key, not a field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagData {
    pub name: String,
    pub person_id: String,
    pub usage_type: UsageType,
    /// Assigned by the store at creation
    pub created_at: DateTime<Utc>,
}

/// A tag together with its store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: DocumentId,
    pub name: String,
    pub person_id: String,
    pub usage_type: UsageType,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn from_parts(id: DocumentId, data: TagData) -> Self {
        Tag {
            id,
            name: data.name,
            person_id: data.person_id,
            usage_type: data.usage_type,
            created_at: data.created_at,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.usage_type == UsageType::Expense
    }

    pub fn is_gain(&self) -> bool {
        self.usage_type == UsageType::Gain
    }
}

fn decode_tag_data(id: &str, fields: Fields) -> Result<TagData, StoreError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::Corrupt {
        collection: TAGS_COLLECTION.to_string(),
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn store_failure(operation: &'static str, cause: StoreError) -> TagError {
    tracing::warn!(operation, error = %cause, "tag store operation failed");
    TagError::StoreFailure { cause }
}

fn require_non_empty(value: &str, what: &str) -> TagResult<()> {
    if value.trim().is_empty() {
        return Err(TagError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(())
}

// ============================================================================
// TAG REPOSITORY
// ============================================================================

/// Create/read/list/delete of tags against an injected document store
///
/// Every store fault comes back as `TagError::StoreFailure` carrying the
/// cause. Calls are independent: nothing here locks, retries or coordinates
/// across documents, so a `list_tags` snapshot can be stale by the time a
/// later `delete_tag` runs.
#[derive(Clone)]
pub struct TagRepository {
    store: Arc<dyn DocumentStore>,
}

impl TagRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TagRepository { store }
    }

    /// Create a tag and return its new id
    pub async fn add_tag(
        &self,
        name: &str,
        person_id: &str,
        usage_type: UsageType,
    ) -> TagResult<DocumentId> {
        require_non_empty(name, "tag name")?;
        require_non_empty(person_id, "person id")?;

        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::from(name));
        fields.insert("personId".to_string(), Value::from(person_id));
        fields.insert("usageType".to_string(), Value::from(usage_type.as_str()));
        let document = NewDocument::new(fields).with_server_timestamp("createdAt");

        let id = self
            .store
            .create(TAGS_COLLECTION, document)
            .await
            .map_err(|e| store_failure("add_tag", e))?;

        tracing::debug!(id = %id, person_id, usage_type = %usage_type, "added tag");
        Ok(id)
    }

    /// Remove a tag; removing an absent tag succeeds
    pub async fn delete_tag(&self, id: &str) -> TagResult<()> {
        require_non_empty(id, "tag id")?;

        self.store
            .delete(TAGS_COLLECTION, id)
            .await
            .map_err(|e| store_failure("delete_tag", e))?;

        tracing::debug!(id, "deleted tag");
        Ok(())
    }

    /// Stored attributes of one tag, `TagError::NotFound` when absent
    pub async fn get_tag(&self, id: &str) -> TagResult<TagData> {
        require_non_empty(id, "tag id")?;

        let fields = self
            .store
            .get(TAGS_COLLECTION, id)
            .await
            .map_err(|e| store_failure("get_tag", e))?
            .ok_or_else(|| TagError::NotFound { id: id.to_string() })?;

        decode_tag_data(id, fields).map_err(|e| store_failure("get_tag", e))
    }

    /// Every tag in the collection, in store order
    pub async fn list_tags(&self) -> TagResult<Vec<Tag>> {
        let documents = self
            .store
            .list(TAGS_COLLECTION)
            .await
            .map_err(|e| store_failure("list_tags", e))?;

        let tags = documents
            .into_iter()
            .map(|doc| {
                let data = decode_tag_data(&doc.id, doc.fields)?;
                Ok(Tag::from_parts(doc.id, data))
            })
            .collect::<Result<Vec<_>, StoreError>>()
            .map_err(|e| store_failure("list_tags", e))?;

        tracing::debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    /// Tags owned by one person
    pub async fn list_tags_for_person(&self, person_id: &str) -> TagResult<Vec<Tag>> {
        require_non_empty(person_id, "person id")?;

        let mut tags = self.list_tags().await?;
        tags.retain(|tag| tag.person_id == person_id);
        Ok(tags)
    }

    /// Tags applying to one financial flow
    pub async fn list_tags_by_usage(&self, usage_type: UsageType) -> TagResult<Vec<Tag>> {
        let mut tags = self.list_tags().await?;
        tags.retain(|tag| tag.usage_type == usage_type);
        Ok(tags)
    }
}

impl fmt::Debug for TagRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRepository")
            .field("collection", &TAGS_COLLECTION)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
