use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Type alias for content object identifiers
pub type ObjectId = u64;

/// Type alias for index entry identifiers
pub type EntryId = Uuid;

/// Maximum length of a stemmed index key, in characters.
pub const MAX_KEY_LEN: usize = 300;

/// One row of the smartlink index.
///
/// The triple `(value, content_type, object_id)` is unique across the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEntry {
    /// UUIDv7 for time-sortability.
    pub id: EntryId,

    /// Stemmed search key.
    pub value: String,

    /// Name of the content type the object belongs to.
    pub content_type: String,

    pub object_id: ObjectId,

    pub created_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn new(value: String, content_type: String, object_id: ObjectId) -> Self {
        Self {
            id: Uuid::now_v7(),
            value,
            content_type,
            object_id,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' for ({}-{})", self.value, self.content_type, self.object_id)
    }
}

/// Outcome of a lookup that may match zero, one or many objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// More than one distinct object matched.
    Ambiguous,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse a list of distinct candidates into a lookup outcome.
    pub fn from_candidates(mut candidates: Vec<T>) -> Self {
        match candidates.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(candidates.remove(0)),
            _ => Lookup::Ambiguous,
        }
    }
}

/// Object lifecycle notification delivered by the host's object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectEvent {
    Created,
    Updated,
    Deleted,
}

/// Index statistics
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub entry_count: u64,
    pub entries_by_content_type: BTreeMap<String, u64>,
    pub object_count: u64,
    pub db_size_bytes: u64,
}
