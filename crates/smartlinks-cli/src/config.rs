use crate::store::JsonSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smartlinks_core::{FieldSet, LinkConfiguration, Registry, Template, Templates, DEFAULT_URL_FIELD};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `smartlinks.toml`: where the index lives and which content types link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartlinksConfig {
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default)]
    pub types: Vec<TypeConfig>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One `[[types]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConfig {
    pub name: String,
    pub shortcuts: Vec<String>,

    /// JSON file holding an array of objects, each with a numeric `id`.
    pub records: PathBuf,

    /// Declared fields. Defaults to every key found in the records.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Field-sets indexed for lookup; `"title"` or `["title", "year"]`.
    #[serde(default)]
    pub searched_fields: Option<Vec<FieldSetSpec>>,

    #[serde(default)]
    pub embeddable_attributes: Vec<String>,

    /// Embed name to the template it renders. Record fields and embed
    /// options are available as variables, positional options as `{{ 0 }}`.
    #[serde(default)]
    pub embeds: BTreeMap<String, String>,

    #[serde(default)]
    pub url_field: Option<String>,

    /// Records whose value for this field is falsy are out of scope.
    #[serde(default)]
    pub scope_field: Option<String>,

    /// Template for the default string representation.
    #[serde(default)]
    pub display: Option<String>,

    #[serde(default)]
    pub templates: TemplateOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSetSpec {
    One(String),
    Many(Vec<String>),
}

impl From<&FieldSetSpec> for FieldSet {
    fn from(spec: &FieldSetSpec) -> Self {
        match spec {
            FieldSetSpec::One(path) => FieldSet::from(path.as_str()),
            FieldSetSpec::Many(paths) => FieldSet::from(paths.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateOverrides {
    pub link: Option<String>,
    pub unresolved: Option<String>,
    pub ambiguous: Option<String>,
    pub type_unresolved: Option<String>,
    pub disallowed: Option<String>,
}

impl TemplateOverrides {
    fn apply(&self, mut templates: Templates) -> Templates {
        let overrides = [
            (&self.link, &mut templates.link),
            (&self.unresolved, &mut templates.unresolved),
            (&self.ambiguous, &mut templates.ambiguous),
            (&self.type_unresolved, &mut templates.type_unresolved),
            (&self.disallowed, &mut templates.disallowed),
        ];
        for (source, template) in overrides {
            if let Some(source) = source {
                *template = Template::new(source.as_str());
            }
        }
        templates
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("smartlinks.redb")
}

impl Default for SmartlinksConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            types: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl SmartlinksConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    /// Problems found without touching the records. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.index_path.as_os_str().is_empty() {
            errors.push("index_path must not be empty".to_string());
        }

        let mut seen = Vec::new();
        for type_config in &self.types {
            let name = &type_config.name;
            if name.is_empty() {
                errors.push("a [[types]] table has an empty name".to_string());
            } else if seen.contains(&name) {
                errors.push(format!("type '{}' is configured twice", name));
            }
            seen.push(name);

            if type_config.shortcuts.is_empty() {
                errors.push(format!("type '{}' has no shortcuts", name));
            }

            let records = self.resolve(&type_config.records);
            if !records.exists() {
                errors.push(format!(
                    "records of type '{}' not found at {}",
                    name,
                    records.display()
                ));
            }

            for attribute in type_config.embeds.keys() {
                if type_config.fields.contains(attribute) {
                    errors.push(format!(
                        "embed '{}' of type '{}' shadows a field",
                        attribute, name
                    ));
                }
            }
        }

        errors
    }

    /// Load every type's records and register its configuration.
    pub fn build_registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        for type_config in &self.types {
            let source = JsonSource::load(type_config, &self.resolve(&type_config.records))
                .with_context(|| format!("Failed to load records of type '{}'", type_config.name))?;
            log::debug!(
                "Loaded {} records of type '{}'",
                source.len(),
                type_config.name
            );

            let configuration = type_config.configuration(Arc::new(source));
            registry
                .register(type_config.shortcuts.iter().cloned(), Arc::new(configuration))
                .with_context(|| format!("Failed to register type '{}'", type_config.name))?;
        }

        Ok(registry)
    }
}

impl TypeConfig {
    pub fn configuration(&self, source: Arc<JsonSource>) -> LinkConfiguration {
        let url_field = self.url_field.as_deref().unwrap_or(DEFAULT_URL_FIELD);
        let mut configuration = LinkConfiguration::new(source)
            .with_embeddable_attributes(self.embeddable_attributes.iter().cloned())
            .with_url_field(url_field);

        if let Some(field_sets) = &self.searched_fields {
            configuration = configuration.with_searched_fields(field_sets.iter().map(FieldSet::from));
        }

        let templates = self.templates.apply(configuration.templates().clone());
        configuration.with_templates(templates)
    }
}
