//! Keeps the search index in step with object lifecycle events.

use crate::conf::{LinkConfiguration, Registry};
use crate::content::Content;
use crate::error::Result;
use crate::index::SearchIndex;
use crate::types::ObjectEvent;
use std::time::{Duration, Instant};

/// Summary of a full index rebuild
#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    /// Distinct configurations walked.
    pub configurations: usize,

    /// Objects indexed.
    pub objects: usize,

    /// Index rows written.
    pub entries: usize,

    pub duration: Duration,
}

impl RebuildReport {
    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Rebuilt smartlink index: {} configuration(s), {} object(s), {} entries in {:?}",
            self.configurations, self.objects, self.entries, self.duration
        )
    }
}

/// Applies lifecycle events of configured content types to a search index.
pub struct IndexMaintainer<'a> {
    index: &'a dyn SearchIndex,
}

impl<'a> IndexMaintainer<'a> {
    pub fn new(index: &'a dyn SearchIndex) -> Self {
        Self { index }
    }

    /// Synchronize the rows of one object. Returns the number of rows written.
    ///
    /// Updates delete the previous rows and insert the fresh ones in one
    /// transaction. Objects outside the source's scope lose their rows.
    pub fn on_object_event(
        &self,
        configuration: &LinkConfiguration,
        instance: &dyn Content,
        event: ObjectEvent,
    ) -> Result<usize> {
        let content_type = configuration.content_type();
        let object_id = instance.id();

        if event == ObjectEvent::Deleted {
            let removed = self.index.delete_for_object(content_type, object_id)?;
            log::debug!("Dropped {} row(s) of deleted {}-{}", removed, content_type, object_id);
            return Ok(0);
        }

        if configuration.source().filter_by_id(object_id)?.is_none() {
            if event == ObjectEvent::Updated {
                self.index.delete_for_object(content_type, object_id)?;
            }
            log::debug!("{}-{} is out of scope, not indexed", content_type, object_id);
            return Ok(0);
        }

        let keys = configuration.search_keys(instance);
        match event {
            ObjectEvent::Created => self.index.insert_for_object(content_type, object_id, &keys)?,
            _ => self.index.replace_for_object(content_type, object_id, &keys)?,
        }

        Ok(keys.len())
    }

    /// Index every object of the configuration's source as newly created.
    /// Assumes the index holds no rows for this configuration.
    /// Returns `(objects, entries)`.
    pub fn recreate_index(&self, configuration: &LinkConfiguration) -> Result<(usize, usize)> {
        let mut objects = 0;
        let mut entries = 0;

        for instance in configuration.source().all()? {
            entries += self.on_object_event(configuration, instance.as_ref(), ObjectEvent::Created)?;
            objects += 1;
        }

        Ok((objects, entries))
    }

    /// Wipe the index, then recreate it once per distinct configuration.
    pub fn rebuild(&self, registry: &Registry) -> Result<RebuildReport> {
        let start = Instant::now();
        let mut report = RebuildReport::default();

        self.index.delete_all()?;

        for configuration in registry.configurations() {
            let (objects, entries) = self.recreate_index(configuration)?;
            report.configurations += 1;
            report.objects += objects;
            report.entries += entries;
        }

        report.duration = start.elapsed();
        log::info!("{}", report.summary());

        Ok(report)
    }
}
