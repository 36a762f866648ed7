use crate::error::{Result, SmartlinkError};
use crate::index::traits::SearchIndex;
use crate::stem::stem;
use crate::types::{IndexEntry, IndexStats, Lookup, ObjectId};
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
    WriteTransaction,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Rows keyed by (value, content_type, object_id); ordered keys make exact
// and prefix lookups on `value` plain range scans.
const INDEX_ENTRIES: TableDefinition<(&str, &str, u64), &[u8]> =
    TableDefinition::new("index_entries");

// Secondary index: (content_type, object_id) -> value
const ENTRIES_BY_OBJECT: MultimapTableDefinition<(&str, u64), &str> =
    MultimapTableDefinition::new("entries_by_object");

// Metadata table
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = index_entries + entries_by_object
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Redb-based search index
pub struct RedbIndex {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbIndex {
    /// Open or create an index at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SmartlinkError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(INDEX_ENTRIES)?;
            let _ = write_txn.open_multimap_table(ENTRIES_BY_OBJECT)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(
                    SCHEMA_VERSION_KEY,
                    CURRENT_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = read_txn
            .open_table(META)
            .ok()
            .and_then(|t| {
                t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                    std::str::from_utf8(v.value())
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                })
            })
            .unwrap_or(CURRENT_SCHEMA_VERSION);

        if version == CURRENT_SCHEMA_VERSION {
            Ok(())
        } else {
            Err(SmartlinkError::Validation(format!(
                "Index schema v{} does not match v{}. Delete the index file and run `smartlinks reset-index`.",
                version, CURRENT_SCHEMA_VERSION
            )))
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn serialize_entry(entry: &IndexEntry) -> Result<Vec<u8>> {
        bincode::serialize(entry).map_err(SmartlinkError::from)
    }

    fn deserialize_entry(bytes: &[u8]) -> Result<IndexEntry> {
        bincode::deserialize(bytes).map_err(SmartlinkError::from)
    }

    /// Stem, drop empty keys and de-duplicate.
    fn stemmed_keys(keys: &BTreeSet<String>) -> BTreeSet<String> {
        keys.iter()
            .map(|key| stem(key))
            .filter(|key| !key.is_empty())
            .collect()
    }

    fn insert_rows(
        txn: &WriteTransaction,
        content_type: &str,
        object_id: ObjectId,
        values: &BTreeSet<String>,
    ) -> Result<()> {
        let mut entries = txn.open_table(INDEX_ENTRIES)?;
        let mut by_object = txn.open_multimap_table(ENTRIES_BY_OBJECT)?;

        for value in values {
            let key = (value.as_str(), content_type, object_id);
            if entries.get(key)?.is_some() {
                return Err(SmartlinkError::DuplicateEntry {
                    value: value.clone(),
                    content_type: content_type.to_string(),
                    object_id,
                });
            }

            let entry = IndexEntry::new(value.clone(), content_type.to_string(), object_id);
            let bytes = Self::serialize_entry(&entry)?;
            entries.insert(key, bytes.as_slice())?;
            by_object.insert((content_type, object_id), value.as_str())?;
        }

        Ok(())
    }

    fn delete_rows(
        txn: &WriteTransaction,
        content_type: &str,
        object_id: ObjectId,
    ) -> Result<usize> {
        let values: Vec<String> = {
            let by_object = txn.open_multimap_table(ENTRIES_BY_OBJECT)?;
            let values = by_object
                .get((content_type, object_id))?
                .map(|result| result.map(|guard| guard.value().to_string()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            values
        };

        {
            let mut entries = txn.open_table(INDEX_ENTRIES)?;
            for value in &values {
                entries.remove((value.as_str(), content_type, object_id))?;
            }
        }

        {
            let mut by_object = txn.open_multimap_table(ENTRIES_BY_OBJECT)?;
            by_object.remove_all((content_type, object_id))?;
        }

        Ok(values.len())
    }
}

impl SearchIndex for RedbIndex {
    fn lookup(&self, key: &str, content_type: &str) -> Result<Lookup<ObjectId>> {
        let value = stem(key);
        if value.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INDEX_ENTRIES)?;

        let start = (value.as_str(), content_type, 0u64);
        let end = (value.as_str(), content_type, u64::MAX);

        let mut object_ids = Vec::new();
        for item in table.range(start..=end)? {
            let (row, _) = item?;
            let (_, _, object_id) = row.value();
            object_ids.push(object_id);
            if object_ids.len() > 1 {
                break;
            }
        }

        log::debug!(
            "exact lookup '{}' in {}: {} candidate(s)",
            value,
            content_type,
            object_ids.len()
        );
        Ok(Lookup::from_candidates(object_ids))
    }

    fn lookup_prefix(&self, key: &str, content_type: &str) -> Result<Lookup<ObjectId>> {
        let prefix = stem(key);
        if prefix.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INDEX_ENTRIES)?;

        let mut object_ids = BTreeSet::new();
        for item in table.range((prefix.as_str(), "", 0u64)..)? {
            let (row, _) = item?;
            let (value, row_type, object_id) = row.value();
            if !value.starts_with(prefix.as_str()) {
                break;
            }
            if row_type == content_type {
                object_ids.insert(object_id);
                if object_ids.len() > 1 {
                    break;
                }
            }
        }

        log::debug!(
            "prefix lookup '{}' in {}: {} candidate(s)",
            prefix,
            content_type,
            object_ids.len()
        );
        Ok(Lookup::from_candidates(object_ids.into_iter().collect()))
    }

    fn put(&self, key: &str, content_type: &str, object_id: ObjectId) -> Result<()> {
        let values: BTreeSet<String> = [stem(key)]
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect();

        let write_txn = self.db.begin_write()?;
        Self::insert_rows(&write_txn, content_type, object_id, &values)?;
        write_txn.commit()?;
        Ok(())
    }

    fn insert_for_object(
        &self,
        content_type: &str,
        object_id: ObjectId,
        keys: &BTreeSet<String>,
    ) -> Result<()> {
        let values = Self::stemmed_keys(keys);

        let write_txn = self.db.begin_write()?;
        Self::insert_rows(&write_txn, content_type, object_id, &values)?;
        write_txn.commit()?;

        log::debug!(
            "indexed {}-{} under {} key(s)",
            content_type,
            object_id,
            values.len()
        );
        Ok(())
    }

    fn replace_for_object(
        &self,
        content_type: &str,
        object_id: ObjectId,
        keys: &BTreeSet<String>,
    ) -> Result<()> {
        let values = Self::stemmed_keys(keys);

        // Single write transaction: readers see either the old rows or the new ones
        let write_txn = self.db.begin_write()?;
        let removed = Self::delete_rows(&write_txn, content_type, object_id)?;
        Self::insert_rows(&write_txn, content_type, object_id, &values)?;
        write_txn.commit()?;

        log::debug!(
            "reindexed {}-{}: {} row(s) removed, {} inserted",
            content_type,
            object_id,
            removed,
            values.len()
        );
        Ok(())
    }

    fn delete_for_object(&self, content_type: &str, object_id: ObjectId) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = Self::delete_rows(&write_txn, content_type, object_id)?;
        write_txn.commit()?;

        log::debug!("removed {} row(s) of {}-{}", removed, content_type, object_id);
        Ok(removed)
    }

    fn delete_all(&self) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(INDEX_ENTRIES)?;
        write_txn.delete_multimap_table(ENTRIES_BY_OBJECT)?;
        {
            let _ = write_txn.open_table(INDEX_ENTRIES)?;
            let _ = write_txn.open_multimap_table(ENTRIES_BY_OBJECT)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn entries_for_object(&self, content_type: &str, object_id: ObjectId) -> Result<Vec<IndexEntry>> {
        let read_txn = self.db.begin_read()?;
        let entries = read_txn.open_table(INDEX_ENTRIES)?;
        let by_object = read_txn.open_multimap_table(ENTRIES_BY_OBJECT)?;

        let values: Vec<String> = by_object
            .get((content_type, object_id))?
            .map(|result| result.map(|guard| guard.value().to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(values.len());
        for value in values {
            if let Some(bytes) = entries.get((value.as_str(), content_type, object_id))? {
                out.push(Self::deserialize_entry(bytes.value())?);
            }
        }

        Ok(out)
    }

    fn stats(&self) -> Result<IndexStats> {
        let read_txn = self.db.begin_read()?;
        let entries = read_txn.open_table(INDEX_ENTRIES)?;

        let mut stats = IndexStats::default();
        let mut objects = BTreeSet::new();

        for item in entries.iter()? {
            let (row, _) = item?;
            let (_, content_type, object_id) = row.value();
            stats.entry_count += 1;
            *stats
                .entries_by_content_type
                .entry(content_type.to_string())
                .or_insert(0) += 1;
            objects.insert((content_type.to_string(), object_id));
        }

        stats.object_count = objects.len() as u64;
        stats.db_size_bytes = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(stats)
    }
}
