use crate::content::{resolve_path, Content, Member, ObjectSource, DISPLAY_FIELD, PK_FIELD};
use crate::error::{Result, SmartlinkError};
use crate::index::SearchIndex;
use crate::stem::stem;
use crate::template::Templates;
use crate::types::Lookup;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Default name of the field holding an object's canonical URL.
pub const DEFAULT_URL_FIELD: &str = "url";

/// Ordered field paths whose values are concatenated into one search key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FieldSet {
    fn from(path: &str) -> Self {
        Self(vec![path.to_string()])
    }
}

impl From<String> for FieldSet {
    fn from(path: String) -> Self {
        Self(vec![path])
    }
}

impl<const N: usize> From<[&str; N]> for FieldSet {
    fn from(paths: [&str; N]) -> Self {
        Self::new(paths)
    }
}

impl From<Vec<String>> for FieldSet {
    fn from(paths: Vec<String>) -> Self {
        Self(paths)
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Resolves a query to an object of one configuration.
///
/// Override to link to objects that are not in the index, e.g. proxies for
/// pages of an external wiki.
pub trait ObjectFinder: Send + Sync {
    fn find_object(
        &self,
        configuration: &LinkConfiguration,
        index: &dyn SearchIndex,
        query: &str,
    ) -> Result<Lookup<Arc<dyn Content>>>;
}

/// Produces the raw search strings of an object. The caller stems them,
/// drops empty ones and removes duplicates.
pub trait SearchStrings: Send + Sync {
    fn search_strings(&self, configuration: &LinkConfiguration, instance: &dyn Content) -> Vec<String>;
}

/// Default finder: exact then prefix lookup in the search index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexFinder;

impl ObjectFinder for IndexFinder {
    fn find_object(
        &self,
        configuration: &LinkConfiguration,
        index: &dyn SearchIndex,
        query: &str,
    ) -> Result<Lookup<Arc<dyn Content>>> {
        let key = stem(query);
        if key.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let content_type = configuration.content_type();
        match index.find_object(&key, content_type)? {
            Lookup::Found(object_id) => match configuration.source().get(object_id)? {
                Some(object) => Ok(Lookup::Found(object)),
                None => {
                    log::warn!(
                        "Index row '{}' points at missing object {}-{}",
                        key,
                        content_type,
                        object_id
                    );
                    Ok(Lookup::NotFound)
                }
            },
            Lookup::NotFound => Ok(Lookup::NotFound),
            Lookup::Ambiguous => Ok(Lookup::Ambiguous),
        }
    }
}

/// Default search strings: one per field-set, the values of its paths
/// concatenated in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSetStrings;

impl SearchStrings for FieldSetStrings {
    fn search_strings(&self, configuration: &LinkConfiguration, instance: &dyn Content) -> Vec<String> {
        configuration
            .searched_fields()
            .iter()
            .map(|field_set| {
                field_set
                    .paths()
                    .iter()
                    .map(|path| resolve_path(instance, path).to_text())
                    .collect::<String>()
            })
            .collect()
    }
}

/// Per-content-type smartlink configuration.
///
/// ```ignore
/// LinkConfiguration::new(movies)
///     .with_searched_fields([FieldSet::from("title"), FieldSet::from(["title", "year"])])
///     .with_embeddable_attributes(["image"])
/// ```
#[derive(Clone)]
pub struct LinkConfiguration {
    source: Arc<dyn ObjectSource>,

    /// Field-sets searched when building the index. Default: `pk`, `to_string`.
    searched_fields: Vec<FieldSet>,

    /// Attributes reachable through `{{ … | attribute }}`. Default: none.
    embeddable_attributes: BTreeSet<String>,

    templates: Templates,

    /// Field holding the canonical URL. Default: `url`.
    url_field: String,

    finder: Arc<dyn ObjectFinder>,
    search_strings: Arc<dyn SearchStrings>,
}

impl LinkConfiguration {
    pub fn new(source: Arc<dyn ObjectSource>) -> Self {
        Self {
            source,
            searched_fields: vec![FieldSet::from(PK_FIELD), FieldSet::from(DISPLAY_FIELD)],
            embeddable_attributes: BTreeSet::new(),
            templates: Templates::for_url_field(DEFAULT_URL_FIELD),
            url_field: DEFAULT_URL_FIELD.to_string(),
            finder: Arc::new(IndexFinder),
            search_strings: Arc::new(FieldSetStrings),
        }
    }

    pub fn with_searched_fields<I, F>(mut self, field_sets: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSet>,
    {
        self.searched_fields = field_sets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_embeddable_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embeddable_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Also rebuilds the default link template so it reads the new field.
    /// Call before `with_templates` when overriding both.
    pub fn with_url_field(mut self, url_field: impl Into<String>) -> Self {
        self.url_field = url_field.into();
        self.templates.link = Templates::for_url_field(&self.url_field).link;
        self
    }

    pub fn with_finder(mut self, finder: Arc<dyn ObjectFinder>) -> Self {
        self.finder = finder;
        self
    }

    pub fn with_search_strings(mut self, search_strings: Arc<dyn SearchStrings>) -> Self {
        self.search_strings = search_strings;
        self
    }

    pub fn source(&self) -> &Arc<dyn ObjectSource> {
        &self.source
    }

    /// Name of the content type, taken from the source's schema.
    pub fn content_type(&self) -> &str {
        self.source.schema().name()
    }

    pub fn searched_fields(&self) -> &[FieldSet] {
        &self.searched_fields
    }

    pub fn embeddable_attributes(&self) -> &BTreeSet<String> {
        &self.embeddable_attributes
    }

    /// Exact, case-sensitive membership.
    pub fn is_embeddable(&self, attribute: &str) -> bool {
        self.embeddable_attributes.contains(attribute)
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn url_field(&self) -> &str {
        &self.url_field
    }

    /// Canonical URL of `object`, if it has a non-empty one.
    pub fn url_for(&self, object: &dyn Content) -> Option<String> {
        let url = resolve_path(object, &self.url_field).to_text();
        (!url.is_empty()).then_some(url)
    }

    pub fn find_object(&self, index: &dyn SearchIndex, query: &str) -> Result<Lookup<Arc<dyn Content>>> {
        self.finder.find_object(self, index, query)
    }

    /// Stemmed, non-empty, de-duplicated search keys of `instance`.
    pub fn search_keys(&self, instance: &dyn Content) -> BTreeSet<String> {
        self.search_strings
            .search_strings(self, instance)
            .iter()
            .map(|text| stem(text))
            .filter(|key| !key.is_empty())
            .collect()
    }

    /// Check the configuration against the source's schema.
    ///
    /// The first segment of every field path must be a schema member or a
    /// pseudo-field, and a method member must take no arguments. Deeper
    /// segments are only checked when the index is built.
    pub fn validate(&self) -> Result<()> {
        let schema = self.source.schema();

        for field_set in &self.searched_fields {
            if field_set.paths().is_empty() {
                return Err(SmartlinkError::IncorrectlyConfigured(format!(
                    "empty field-set for content type '{}'",
                    schema.name()
                )));
            }

            for path in field_set.paths() {
                if path.split('.').any(str::is_empty) {
                    return Err(SmartlinkError::IncorrectlyConfigured(format!(
                        "malformed field path '{}' for content type '{}'",
                        path,
                        schema.name()
                    )));
                }

                let first = path.split('.').next().unwrap_or_default();
                if first == PK_FIELD || first == DISPLAY_FIELD {
                    continue;
                }

                match schema.member(first) {
                    None => {
                        return Err(SmartlinkError::IncorrectlyConfigured(format!(
                            "field '{}' does not exist on content type '{}'",
                            first,
                            schema.name()
                        )))
                    }
                    Some(Member::Method { required_args }) if required_args > 0 => {
                        return Err(SmartlinkError::IncorrectlyConfigured(format!(
                            "method '{}' of content type '{}' takes {} required argument(s), expected none",
                            first,
                            schema.name(),
                            required_args
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        for attribute in &self.embeddable_attributes {
            if schema.member(attribute).is_none() {
                return Err(SmartlinkError::IncorrectlyConfigured(format!(
                    "embeddable attribute '{}' does not exist on content type '{}'",
                    attribute,
                    schema.name()
                )));
            }
        }

        if self.url_field.is_empty() {
            return Err(SmartlinkError::IncorrectlyConfigured(
                "url_field must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for LinkConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConfiguration")
            .field("content_type", &self.content_type())
            .field("searched_fields", &self.searched_fields)
            .field("embeddable_attributes", &self.embeddable_attributes)
            .field("url_field", &self.url_field)
            .finish()
    }
}
