use super::grammar::{Grammar, LinkKind, ParsedLink};
use crate::conf::{LinkConfiguration, Registry};
use crate::content::Content;
use crate::error::{Result, SmartlinkError};
use crate::index::SearchIndex;
use crate::template::{Template, TemplateContext, TemplateRenderer};
use crate::types::Lookup;
use std::sync::Arc;

/// Outcome of resolving one smartlink query.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found {
        configuration: Arc<LinkConfiguration>,
        object: Arc<dyn Content>,
    },
    /// Nothing matched. Untyped queries that no configuration matched are
    /// bound to the first configuration.
    Unresolved { configuration: Arc<LinkConfiguration> },
    /// More than one object matched within `configuration`.
    Ambiguous { configuration: Arc<LinkConfiguration> },
    /// The type hint names no registered shortcut.
    TypeUnresolved,
}

impl Resolution {
    pub fn object(&self) -> Option<&Arc<dyn Content>> {
        match self {
            Resolution::Found { object, .. } => Some(object),
            _ => None,
        }
    }
}

enum Outcome {
    Resolved(Arc<LinkConfiguration>, Arc<dyn Content>),
    Rendered(String),
}

/// Resolves smartlinks against a registry and renders them.
pub struct LinkEngine<'a> {
    registry: &'a Registry,
    index: &'a dyn SearchIndex,
    renderer: &'a dyn TemplateRenderer,
}

impl<'a> LinkEngine<'a> {
    pub fn new(
        registry: &'a Registry,
        index: &'a dyn SearchIndex,
        renderer: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            registry,
            index,
            renderer,
        }
    }

    /// Resolve `query`, restricted to the configuration of `type_hint` if given.
    ///
    /// Without a hint, configurations are tried in registration order; the
    /// first one that finds an object or finds the query ambiguous wins.
    pub fn resolve(&self, type_hint: Option<&str>, query: &str) -> Result<Resolution> {
        let first = self.registry.first().ok_or(SmartlinkError::NoConfiguration)?;

        if let Some(shortcut) = type_hint {
            let Some(configuration) = self.registry.get(shortcut) else {
                return Ok(Resolution::TypeUnresolved);
            };
            return Ok(
                match configuration.find_object(self.index, query)? {
                    Lookup::Found(object) => Resolution::Found {
                        configuration: Arc::clone(configuration),
                        object,
                    },
                    Lookup::NotFound => Resolution::Unresolved {
                        configuration: Arc::clone(configuration),
                    },
                    Lookup::Ambiguous => Resolution::Ambiguous {
                        configuration: Arc::clone(configuration),
                    },
                },
            );
        }

        for configuration in self.registry.configurations() {
            match configuration.find_object(self.index, query)? {
                Lookup::Found(object) => {
                    return Ok(Resolution::Found {
                        configuration: Arc::clone(configuration),
                        object,
                    })
                }
                Lookup::Ambiguous => {
                    return Ok(Resolution::Ambiguous {
                        configuration: Arc::clone(configuration),
                    })
                }
                Lookup::NotFound => continue,
            }
        }

        Ok(Resolution::Unresolved {
            configuration: Arc::clone(first),
        })
    }

    /// Render every link, then every embed, of `text`.
    pub fn process(&self, text: &str) -> Result<String> {
        let linked = Grammar::link().replace_all(text, |parsed| self.render(parsed))?;
        Grammar::embed().replace_all(&linked, |parsed| self.render(parsed))
    }

    /// Render one parsed smartlink.
    pub fn render(&self, parsed: &ParsedLink) -> Result<String> {
        match &parsed.kind {
            LinkKind::Link { .. } => self.render_link(parsed),
            LinkKind::Embed { .. } => self.render_embed(parsed),
        }
    }

    fn render_link(&self, parsed: &ParsedLink) -> Result<String> {
        let (configuration, object) = match self.resolve_or_render(parsed)? {
            Outcome::Resolved(configuration, object) => (configuration, object),
            Outcome::Rendered(text) => return Ok(text),
        };

        let context = TemplateContext::new()
            .with_object("object", object)
            .with_text("label", parsed.label());
        Ok(self.render_template(&configuration.templates().link, &context))
    }

    fn render_embed(&self, parsed: &ParsedLink) -> Result<String> {
        let LinkKind::Embed { attribute, options } = &parsed.kind else {
            return self.render_link(parsed);
        };

        let (configuration, object) = match self.resolve_or_render(parsed)? {
            Outcome::Resolved(configuration, object) => (configuration, object),
            Outcome::Rendered(text) => return Ok(text),
        };

        if !configuration.is_embeddable(attribute) {
            log::debug!(
                "Embed of '{}' is not allowed for '{}'",
                attribute,
                configuration.content_type()
            );
            let context = TemplateContext::new()
                .with_text("full_match_text", parsed.full_text.as_str())
                .with_text("label", parsed.label());
            return Ok(self.render_template(&configuration.templates().disallowed, &context));
        }

        match object.embed(attribute, options) {
            Ok(output) => Ok(output),
            Err(err) => {
                log::warn!(
                    "Embed '{}' of {}-{} failed: {}",
                    attribute,
                    configuration.content_type(),
                    object.id(),
                    err
                );
                let context = TemplateContext::new().with_text("label", parsed.label());
                Ok(self.render_template(&configuration.templates().unresolved, &context))
            }
        }
    }

    /// Resolve `parsed`, rendering the matching failure template when it
    /// does not resolve to exactly one object.
    fn resolve_or_render(&self, parsed: &ParsedLink) -> Result<Outcome> {
        let label_only = TemplateContext::new().with_text("label", parsed.label());

        let rendered = match self.resolve(parsed.type_hint.as_deref(), &parsed.query)? {
            Resolution::Found {
                configuration,
                object,
            } => return Ok(Outcome::Resolved(configuration, object)),
            Resolution::Unresolved { configuration } => {
                self.render_template(&configuration.templates().unresolved, &label_only)
            }
            Resolution::Ambiguous { configuration } => {
                self.render_template(&configuration.templates().ambiguous, &label_only)
            }
            Resolution::TypeUnresolved => {
                let first = self.registry.first().ok_or(SmartlinkError::NoConfiguration)?;
                let context = TemplateContext::new()
                    .with_text("full_match_text", parsed.full_text.as_str())
                    .with_text("label", parsed.label())
                    .with_text("type_hint", parsed.type_hint.clone().unwrap_or_default());
                self.render_template(&first.templates().type_unresolved, &context)
            }
        };

        Ok(Outcome::Rendered(rendered))
    }

    fn render_template(&self, template: &Template, context: &TemplateContext) -> String {
        self.renderer.render(template, context)
    }

    /// Object a single smartlink at the start of `raw` points at.
    /// `None` when it is not a smartlink or does not resolve to one object.
    pub fn object_for(&self, raw: &str) -> Result<Option<(Arc<LinkConfiguration>, Arc<dyn Content>)>> {
        let Some(parsed) = Grammar::link().parse(raw.trim_start()) else {
            return Ok(None);
        };

        match self.resolve(parsed.type_hint.as_deref(), &parsed.query)? {
            Resolution::Found {
                configuration,
                object,
            } => Ok(Some((configuration, object))),
            _ => Ok(None),
        }
    }

    /// URL of the object a single smartlink points at.
    pub fn url_for(&self, raw: &str) -> Result<Option<String>> {
        Ok(self
            .object_for(raw)?
            .and_then(|(configuration, object)| configuration.url_for(object.as_ref())))
    }
}
