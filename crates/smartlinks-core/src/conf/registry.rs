use super::configuration::LinkConfiguration;
use crate::content::Content;
use crate::error::{Result, SmartlinkError};
use crate::index::SearchIndex;
use crate::maintainer::IndexMaintainer;
use crate::types::ObjectEvent;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static SHORTCUT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("shortcut regex"));

/// Ordered mapping from shortcut names to link configurations.
///
/// Registration order is the priority order of untyped links. The same
/// configuration may be registered under several shortcuts; iterate
/// [`Registry::configurations`] to visit each one once.
#[derive(Debug, Default)]
pub struct Registry {
    shortcuts: IndexMap<String, Arc<LinkConfiguration>>,
    /// Event subscriptions: content type -> the configuration indexing it.
    subscribers: IndexMap<String, Arc<LinkConfiguration>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `configuration` under every name in `shortcuts`.
    ///
    /// Nothing is bound unless every check passes. Returns the full mapping.
    pub fn register<I, S>(
        &mut self,
        shortcuts: I,
        configuration: Arc<LinkConfiguration>,
    ) -> Result<&IndexMap<String, Arc<LinkConfiguration>>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let shortcuts: Vec<String> = shortcuts.into_iter().map(Into::into).collect();
        let content_type = configuration.content_type().to_string();

        configuration.validate()?;

        if shortcuts.is_empty() {
            return Err(SmartlinkError::IncorrectlyConfigured(format!(
                "no shortcut given for content type '{}'",
                content_type
            )));
        }

        for (position, shortcut) in shortcuts.iter().enumerate() {
            if !SHORTCUT_REGEX.is_match(shortcut) {
                return Err(SmartlinkError::IncorrectlyConfigured(format!(
                    "shortcut '{}' must consist of word characters only",
                    shortcut
                )));
            }
            if self.shortcuts.contains_key(shortcut) || shortcuts[..position].contains(shortcut) {
                return Err(SmartlinkError::AlreadyRegistered {
                    shortcut: shortcut.clone(),
                });
            }
        }

        if let Some(existing) = self.subscribers.get(&content_type) {
            if !Arc::ptr_eq(existing, &configuration) {
                return Err(SmartlinkError::IncorrectlyConfigured(format!(
                    "content type '{}' already has a configuration; register further shortcuts with the same one",
                    content_type
                )));
            }
        }

        for shortcut in &shortcuts {
            self.shortcuts
                .insert(shortcut.clone(), Arc::clone(&configuration));
        }
        self.subscribers
            .entry(content_type.clone())
            .or_insert_with(|| Arc::clone(&configuration));

        log::info!(
            "Registered smartlink configuration for '{}' as {}",
            content_type,
            shortcuts.join(", ")
        );

        Ok(&self.shortcuts)
    }

    pub fn get(&self, shortcut: &str) -> Option<&Arc<LinkConfiguration>> {
        self.shortcuts.get(shortcut)
    }

    /// Configuration of the first registered shortcut.
    pub fn first(&self) -> Option<&Arc<LinkConfiguration>> {
        self.shortcuts.values().next()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn shortcuts(&self) -> &IndexMap<String, Arc<LinkConfiguration>> {
        &self.shortcuts
    }

    /// Distinct configurations in registration order, de-duplicated by identity.
    pub fn configurations(&self) -> Vec<&Arc<LinkConfiguration>> {
        let mut seen: Vec<&Arc<LinkConfiguration>> = Vec::new();
        for configuration in self.shortcuts.values() {
            if !seen.iter().any(|known| Arc::ptr_eq(known, configuration)) {
                seen.push(configuration);
            }
        }
        seen
    }

    /// Configuration subscribed to events of `content_type`.
    pub fn for_content_type(&self, content_type: &str) -> Option<&Arc<LinkConfiguration>> {
        self.subscribers.get(content_type)
    }

    /// Deliver an object lifecycle event. Events of content types without a
    /// configuration are ignored. Returns the number of index rows written.
    pub fn notify(
        &self,
        index: &dyn SearchIndex,
        content_type: &str,
        instance: &dyn Content,
        event: ObjectEvent,
    ) -> Result<usize> {
        match self.subscribers.get(content_type) {
            Some(configuration) => {
                IndexMaintainer::new(index).on_object_event(configuration, instance, event)
            }
            None => {
                log::debug!("No smartlink configuration for '{}', ignoring {:?}", content_type, event);
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSchema, MemorySource};

    fn configuration(content_type: &str) -> Arc<LinkConfiguration> {
        let schema = ContentSchema::new(content_type).with_fields(["title", "year"]);
        Arc::new(
            LinkConfiguration::new(Arc::new(MemorySource::new(schema)))
                .with_searched_fields(["title"]),
        )
    }

    #[test]
    fn test_register_aliases() {
        let mut registry = Registry::new();
        let movies = configuration("movie");
        let events = configuration("event");

        let mapping = registry.register(["m", "movie"], movies.clone()).unwrap();
        assert_eq!(mapping.len(), 2);
        registry.register(["e"], events.clone()).unwrap();
        // Another alias of an already registered configuration
        registry.register(["film"], movies.clone()).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.shortcuts().keys().collect::<Vec<_>>(),
            vec!["m", "movie", "e", "film"]
        );

        let configurations = registry.configurations();
        assert_eq!(configurations.len(), 2);
        assert!(Arc::ptr_eq(configurations[0], &movies));
        assert!(Arc::ptr_eq(configurations[1], &events));
        assert!(Arc::ptr_eq(registry.first().unwrap(), &movies));
        assert!(Arc::ptr_eq(registry.for_content_type("event").unwrap(), &events));
    }

    #[test]
    fn test_register_same_shortcut_twice_fails() {
        let mut registry = Registry::new();
        registry.register(["m"], configuration("movie")).unwrap();

        let err = registry.register(["e", "m"], configuration("event")).unwrap_err();
        assert!(matches!(err, SmartlinkError::AlreadyRegistered { ref shortcut } if shortcut == "m"));

        // Nothing from the failed call was bound
        assert!(registry.get("e").is_none());
        assert!(registry.for_content_type("event").is_none());
    }

    #[test]
    fn test_register_repeated_shortcut_in_one_call_fails() {
        let mut registry = Registry::new();
        let err = registry.register(["m", "m"], configuration("movie")).unwrap_err();
        assert!(matches!(err, SmartlinkError::AlreadyRegistered { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_invalid_fields_fails() {
        let mut registry = Registry::new();
        let schema = ContentSchema::new("movie").with_field("title");
        let conf = LinkConfiguration::new(Arc::new(MemorySource::new(schema)))
            .with_searched_fields(["director"]);

        let err = registry.register(["m"], Arc::new(conf)).unwrap_err();
        assert!(matches!(err, SmartlinkError::IncorrectlyConfigured(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_rejects_non_word_shortcut() {
        let mut registry = Registry::new();
        let err = registry.register(["my movie"], configuration("movie")).unwrap_err();
        assert!(matches!(err, SmartlinkError::IncorrectlyConfigured(_)));

        let err = registry
            .register(Vec::<String>::new(), configuration("movie"))
            .unwrap_err();
        assert!(matches!(err, SmartlinkError::IncorrectlyConfigured(_)));
    }

    #[test]
    fn test_second_configuration_for_content_type_fails() {
        let mut registry = Registry::new();
        registry.register(["m"], configuration("movie")).unwrap();

        let err = registry.register(["film"], configuration("movie")).unwrap_err();
        assert!(matches!(err, SmartlinkError::IncorrectlyConfigured(_)));
        assert!(registry.get("film").is_none());
    }
}
