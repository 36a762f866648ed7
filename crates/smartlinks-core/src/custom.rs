//! User-managed smartlinks: a list of shortcuts resolving to a fixed URL.

use crate::conf::{LinkConfiguration, SearchStrings};
use crate::content::{Content, ContentSchema, FieldValue, ObjectSource};
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Content type name of custom links.
pub const CUSTOM_LINK_TYPE: &str = "custom_link";

/// A custom smartlink. Each line of `shortcuts` is indexed on its own, so
/// `[[ shortcut ]]` resolves to `url` for every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLink {
    pub id: ObjectId,

    /// One shortcut per line.
    pub shortcuts: String,

    /// Absolute or relative URL.
    pub url: String,

    #[serde(default)]
    pub description: String,
}

impl CustomLink {
    pub fn new(id: ObjectId, shortcuts: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            shortcuts: shortcuts.into(),
            url: url.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Non-blank shortcut lines, trimmed.
    pub fn shortcut_lines(&self) -> impl Iterator<Item = &str> {
        self.shortcuts
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn schema() -> ContentSchema {
        ContentSchema::new(CUSTOM_LINK_TYPE).with_fields(["shortcuts", "url", "description"])
    }

    /// Configuration indexing one key per shortcut line.
    pub fn configuration(source: Arc<dyn ObjectSource>) -> LinkConfiguration {
        LinkConfiguration::new(source)
            .with_searched_fields(["shortcuts"])
            .with_search_strings(Arc::new(ShortcutLines))
    }
}

impl fmt::Display for CustomLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shortcuts: Vec<String> = self
            .shortcut_lines()
            .map(|line| format!("[[ {} ]]", line))
            .collect();
        write!(f, "{} → {}", shortcuts.join(", "), self.url)
    }
}

impl Content for CustomLink {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "shortcuts" => Some(self.shortcuts.as_str().into()),
            "url" => Some(self.url.as_str().into()),
            "description" => Some(self.description.as_str().into()),
            _ => None,
        }
    }
}

/// Search strings: every line of the `shortcuts` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortcutLines;

impl SearchStrings for ShortcutLines {
    fn search_strings(&self, _configuration: &LinkConfiguration, instance: &dyn Content) -> Vec<String> {
        instance
            .get_field("shortcuts")
            .map(|value| value.to_text())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
