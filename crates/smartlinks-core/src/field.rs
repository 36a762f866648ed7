//! A stored value holding a single smartlink, e.g. a "related page" field.

use crate::content::Content;
use crate::error::{Result, SmartlinkError};
use crate::parser::{Grammar, LinkEngine, Resolution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Wrap bare text in link brackets: `Scar Face` becomes `[[ Scar Face ]]`.
/// Empty input stays empty; input already starting with `[` is kept.
pub fn normalize_input(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value.starts_with('[') {
        value.to_string()
    } else {
        format!("[[ {} ]]", value)
    }
}

/// The raw text of a smartlink field plus accessors resolving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmartLink {
    raw: String,
}

impl SmartLink {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Build from user input, adding brackets if missing.
    pub fn from_input(value: &str) -> Self {
        Self::new(normalize_input(value))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// The verbose text, or the query when there is none.
    pub fn label(&self) -> Option<String> {
        Grammar::link()
            .parse(self.raw.trim_start())
            .map(|parsed| parsed.label().to_string())
    }

    /// The object linked to, `None` when unresolved or ambiguous.
    pub fn object(&self, engine: &LinkEngine<'_>) -> Result<Option<Arc<dyn Content>>> {
        Ok(engine.object_for(&self.raw)?.map(|(_, object)| object))
    }

    /// URL of the object linked to, empty when unresolved.
    pub fn url(&self, engine: &LinkEngine<'_>) -> Result<String> {
        Ok(engine.url_for(&self.raw)?.unwrap_or_default())
    }

    /// The field rendered through the link templates.
    pub fn rendered(&self, engine: &LinkEngine<'_>) -> Result<String> {
        engine.process(&self.raw)
    }
}

impl fmt::Display for SmartLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for SmartLink {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SmartLink {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Checks that a value is a well-formed smartlink and, optionally, that it
/// resolves to an existing object.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartLinkValidator {
    pub verify_exists: bool,
}

impl SmartLinkValidator {
    pub const MESSAGE: &'static str = "Enter a valid smartlink. The syntax is \
        [[ smartlink ]] or [[ smartlink | verbose text ]] \
        or [[ model->smartlink ]] or [[ model->smartlink | verbose text ]].";

    pub const UNRESOLVED_MESSAGE: &'static str = "This smartlink has correct formatting, \
        but it did not resolve to a valid existing object.";

    pub fn new(verify_exists: bool) -> Self {
        Self { verify_exists }
    }

    /// Empty values are always valid.
    pub fn validate(&self, value: &str, engine: &LinkEngine<'_>) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }

        let parsed = Grammar::link()
            .parse(value)
            .or_else(|| Grammar::embed().parse(value))
            .ok_or_else(|| SmartlinkError::Validation(Self::MESSAGE.into()))?;

        if self.verify_exists {
            let resolution = engine.resolve(parsed.type_hint.as_deref(), &parsed.query)?;
            if !matches!(resolution, Resolution::Found { .. }) {
                return Err(SmartlinkError::Validation(Self::UNRESOLVED_MESSAGE.into()));
            }
        }

        Ok(())
    }
}
