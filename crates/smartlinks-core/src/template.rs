//! Minimal `{{ variable }}` templates for rendered smartlinks.
//!
//! The engine never inspects templates beyond variable substitution; hosts
//! with a real template engine plug it in through [`TemplateRenderer`].

use crate::content::{resolve_path, Content};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?P<path>\w+(?:\.\w+)*)\s*\}\}").expect("template variable regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Dot-separated variable path, e.g. `object.url`.
    Variable(Vec<String>),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in VARIABLE_REGEX.captures_iter(&source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.name("path")) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            segments.push(Segment::Variable(
                path.as_str().split('.').map(str::to_string).collect(),
            ));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self { source, segments }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Top-level variable names referenced by the template.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(path) => path.first().map(String::as_str),
            Segment::Literal(_) => None,
        })
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Template::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Template::new(source)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A value bound to a template variable.
#[derive(Debug, Clone)]
pub enum TemplateValue {
    Text(String),
    /// A content object; `{{ object.field }}` reads through it.
    Object(Arc<dyn Content>),
}

impl TemplateValue {
    fn lookup(&self, rest: &[String]) -> String {
        match self {
            TemplateValue::Text(text) if rest.is_empty() => text.clone(),
            TemplateValue::Text(_) => String::new(),
            TemplateValue::Object(object) if rest.is_empty() => object.to_string(),
            TemplateValue::Object(object) => resolve_path(object.as_ref(), &rest.join(".")).to_text(),
        }
    }
}

/// Named variables handed to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, TemplateValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), TemplateValue::Text(value.into()));
        self
    }

    pub fn with_object(mut self, name: impl Into<String>, object: Arc<dyn Content>) -> Self {
        self.vars.insert(name.into(), TemplateValue::Object(object));
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.vars.get(name)
    }

    /// Resolve a dotted variable path. Unknown variables resolve to `None`.
    pub fn resolve(&self, path: &[String]) -> Option<String> {
        let (first, rest) = path.split_first()?;
        self.vars.get(first).map(|value| value.lookup(rest))
    }
}

/// Turns a template plus a context into final text.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &Template, context: &TemplateContext) -> String;
}

/// Default renderer: substitutes variables, unknown ones render empty.
#[derive(Debug, Clone, Copy)]
pub struct SimpleRenderer {
    escape_html: bool,
}

impl SimpleRenderer {
    /// Substituted values are HTML-escaped.
    pub const fn html() -> Self {
        Self { escape_html: true }
    }

    /// Substituted values are inserted verbatim.
    pub const fn plain() -> Self {
        Self { escape_html: false }
    }
}

impl Default for SimpleRenderer {
    fn default() -> Self {
        Self::html()
    }
}

impl TemplateRenderer for SimpleRenderer {
    fn render(&self, template: &Template, context: &TemplateContext) -> String {
        let mut out = String::with_capacity(template.source.len());
        for segment in &template.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(path) => {
                    let value = context.resolve(path).unwrap_or_default();
                    if self.escape_html {
                        out.push_str(&html_escape::encode_quoted_attribute(&value));
                    } else {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}

/// The five templates of a link configuration.
#[derive(Debug, Clone)]
pub struct Templates {
    /// Resolved link. Variables: `object`, `label`.
    pub link: Template,
    /// No matching object. Variables: `label`.
    pub unresolved: Template,
    /// More than one matching object. Variables: `label`.
    pub ambiguous: Template,
    /// Unknown type hint. Variables: `full_match_text`, `label`, `type_hint`.
    pub type_unresolved: Template,
    /// Embed of an attribute outside the allow-list.
    /// Variables: `full_match_text`, `label`.
    pub disallowed: Template,
}

impl Templates {
    /// Default markup, linking through the object's `url_field`.
    pub fn for_url_field(url_field: &str) -> Self {
        Self {
            link: Template::new(format!(
                "<a href=\"{{{{ object.{} }}}}\" title=\"{{{{ object }}}}\">{{{{ label }}}}</a>",
                url_field
            )),
            unresolved: Template::new("<span class=\"smartlinks-unresolved\">{{ label }}</span>"),
            ambiguous: Template::new("<span class=\"smartlinks-ambiguous\">{{ label }}</span>"),
            type_unresolved: Template::new(
                "<span class=\"smartlinks-unresolved\">{{ label }}</span>",
            ),
            disallowed: Template::new(
                "<span class=\"smartlinks-unallowed\">{{ full_match_text }}</span>",
            ),
        }
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::for_url_field("url")
    }
}
