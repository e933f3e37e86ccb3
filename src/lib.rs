// Finance Tracker - Core Library
// Tag registry and monthly cycle keys, used by the CLI and by embedding apps

pub mod config;
pub mod cycle;
pub mod entities;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use cycle::{
    cycle_key_from_date, Clock, CycleKey, CycleKeyDeriver, CycleKeyError, CycleZone,
    ManualClock, SystemClock,
};
pub use entities::{Tag, TagData, TagRepository, UsageType, TAGS_COLLECTION};
pub use error::{StoreError, StoreResult, TagError, TagResult};
pub use store::{Document, DocumentId, DocumentStore, Fields, MemoryStore, NewDocument, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
