// ⚠️ Errors - Tag registry and document store failures
//
// Two layers:
// - StoreError: what the backing document store reports
// - TagError:   what the tag registry hands back to its callers
//
// "Absent" and "broken" are different answers: NotFound is never a StoreFailure.

use thiserror::Error;

// ============================================================================
// STORE ERRORS
// ============================================================================

/// Failure reported by a `DocumentStore` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected the statement (I/O, locking, constraint, ...)
    #[error("sqlite backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// Fields could not be encoded to / decoded from JSON
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A stored document does not have the expected shape
    #[error("corrupt document {collection}/{id}: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },

    /// The store cannot serve requests right now
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// TAG ERRORS
// ============================================================================

/// Failure returned by every `TagRepository` operation
#[derive(Debug, Error)]
pub enum TagError {
    /// The store rejected or failed the operation; the cause is kept for diagnostics
    #[error("tag store operation failed")]
    StoreFailure {
        #[source]
        cause: StoreError,
    },

    /// No tag exists with this id
    #[error("tag not found: {id}")]
    NotFound { id: String },

    /// Input rejected before reaching the store
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TagError {
    /// Notice a front end should show for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            TagError::StoreFailure { .. } => "The operation failed. Please try again.",
            TagError::NotFound { .. } => "This item does not exist.",
            TagError::InvalidInput(_) => "Some of the provided values are invalid.",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TagError::NotFound { .. })
    }
}

impl From<StoreError> for TagError {
    fn from(cause: StoreError) -> Self {
        TagError::StoreFailure { cause }
    }
}

pub type TagResult<T> = Result<T, TagError>;
