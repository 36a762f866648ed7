use crate::error::Result;
use crate::types::{IndexEntry, IndexStats, Lookup, ObjectId};
use std::collections::BTreeSet;

/// Storage trait for the smartlink search index.
///
/// Implementations stem every key they are given, on writes and on
/// lookups alike, so callers may pass raw text.
pub trait SearchIndex: Send + Sync {
    // === Lookups ===

    /// Exact match on `(key, content_type)`.
    fn lookup(&self, key: &str, content_type: &str) -> Result<Lookup<ObjectId>>;

    /// Rows of `content_type` whose key starts with `key`.
    /// Ambiguity is counted over distinct objects.
    fn lookup_prefix(&self, key: &str, content_type: &str) -> Result<Lookup<ObjectId>>;

    /// Exact match, falling back to a prefix match when nothing matched exactly.
    /// An ambiguous exact match never falls back.
    fn find_object(&self, key: &str, content_type: &str) -> Result<Lookup<ObjectId>> {
        match self.lookup(key, content_type)? {
            Lookup::NotFound => self.lookup_prefix(key, content_type),
            outcome => Ok(outcome),
        }
    }

    // === Writes ===

    /// Insert one row. Fails with `DuplicateEntry` if the row exists.
    fn put(&self, key: &str, content_type: &str, object_id: ObjectId) -> Result<()>;

    /// Insert the rows of one object in a single transaction.
    fn insert_for_object(
        &self,
        content_type: &str,
        object_id: ObjectId,
        keys: &BTreeSet<String>,
    ) -> Result<()>;

    /// Delete every row of one object and insert `keys`, atomically.
    fn replace_for_object(
        &self,
        content_type: &str,
        object_id: ObjectId,
        keys: &BTreeSet<String>,
    ) -> Result<()>;

    /// Remove every row of one object. Returns the number of rows removed.
    fn delete_for_object(&self, content_type: &str, object_id: ObjectId) -> Result<usize>;

    /// Wipe the whole index.
    fn delete_all(&self) -> Result<()>;

    // === Diagnostics ===

    fn entries_for_object(&self, content_type: &str, object_id: ObjectId) -> Result<Vec<IndexEntry>>;

    fn stats(&self) -> Result<IndexStats>;
}
