use crate::conf::{LinkConfiguration, Registry};
use crate::content::Content;
use crate::error::Result;
use crate::index::{RedbIndex, SearchIndex};
use crate::maintainer::{IndexMaintainer, RebuildReport};
use crate::parser::{LinkEngine, Resolution};
use crate::template::{SimpleRenderer, TemplateRenderer};
use crate::types::{IndexStats, ObjectEvent};
use std::path::Path;
use std::sync::Arc;

/// High-level, embedded smartlinks API.
///
/// # Example
/// ```rust,no_run
/// use smartlinks_core::{LinkConfiguration, MemorySource, ContentSchema, Registry, Smartlinks};
/// use std::sync::Arc;
///
/// let movies = Arc::new(MemorySource::new(ContentSchema::new("movie").with_field("title")));
/// let mut registry = Registry::new();
/// registry
///     .register(["m", "movie"], Arc::new(LinkConfiguration::new(movies).with_searched_fields(["title"])))
///     .unwrap();
///
/// let smartlinks = Smartlinks::open("./smartlinks.redb", registry).unwrap();
/// smartlinks.rebuild_index().unwrap();
/// let html = smartlinks.render("See [[ Mad Max ]]").unwrap();
/// ```
pub struct Smartlinks {
    index: Arc<RedbIndex>,
    registry: Arc<Registry>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl Smartlinks {
    /// Open (or create) the index at `path`. The registry is frozen from here on.
    pub fn open(path: impl AsRef<Path>, registry: Registry) -> Result<Self> {
        let index = Arc::new(RedbIndex::open(path.as_ref())?);
        Ok(Self::with_index(index, registry))
    }

    pub fn with_index(index: Arc<RedbIndex>, registry: Registry) -> Self {
        Self {
            index,
            registry: Arc::new(registry),
            renderer: Arc::new(SimpleRenderer::html()),
        }
    }

    /// Replace the default HTML-escaping renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn index(&self) -> &RedbIndex {
        &self.index
    }

    pub fn engine(&self) -> LinkEngine<'_> {
        LinkEngine::new(&self.registry, self.index.as_ref(), self.renderer.as_ref())
    }

    /// Replace every smartlink and smartembed of `text`.
    pub fn render(&self, text: &str) -> Result<String> {
        self.engine().process(text)
    }

    pub fn resolve(&self, type_hint: Option<&str>, query: &str) -> Result<Resolution> {
        self.engine().resolve(type_hint, query)
    }

    pub fn object_for(&self, raw: &str) -> Result<Option<(Arc<LinkConfiguration>, Arc<dyn Content>)>> {
        self.engine().object_for(raw)
    }

    pub fn url_for(&self, raw: &str) -> Result<Option<String>> {
        self.engine().url_for(raw)
    }

    /// Object lifecycle hook; call after every create, update and delete.
    pub fn notify(&self, content_type: &str, instance: &dyn Content, event: ObjectEvent) -> Result<usize> {
        self.registry
            .notify(self.index.as_ref(), content_type, instance, event)
    }

    /// Wipe the index and rebuild it from every configured source.
    pub fn rebuild_index(&self) -> Result<RebuildReport> {
        IndexMaintainer::new(self.index.as_ref()).rebuild(&self.registry)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        self.index.stats()
    }
}
