// Entity Models
// "Identity persists, values change"
//
// Each entity has:
// - Stable identity assigned by the store that NEVER changes
// - A repository for persistence and lookups

pub mod tag;

pub use tag::{Tag, TagData, TagRepository, UsageType, TAGS_COLLECTION};
