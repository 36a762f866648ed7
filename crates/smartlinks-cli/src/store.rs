//! Content objects loaded from JSON record files.

use crate::config::TypeConfig;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use smartlinks_core::{
    Content, ContentSchema, EmbedOptions, FieldValue, ObjectId, ObjectSource, SimpleRenderer,
    SmartlinkError, Template, TemplateContext, TemplateRenderer,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

static RENDERER: SimpleRenderer = SimpleRenderer::html();

/// One JSON object of a records file.
#[derive(Debug)]
pub struct JsonRecord {
    content_type: String,
    id: ObjectId,
    fields: Map<String, Value>,
    display: Option<Arc<Template>>,
    embeds: Arc<BTreeMap<String, Template>>,
}

impl JsonRecord {
    fn context(&self) -> TemplateContext {
        self.fields
            .iter()
            .fold(TemplateContext::new(), |context, (name, value)| {
                context.with_text(name.as_str(), FieldValue::from(value).to_text())
            })
    }

    fn is_truthy(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(value)) => *value,
            Some(Value::Number(value)) => value.as_f64().map_or(false, |n| n != 0.0),
            Some(Value::String(value)) => !value.is_empty(),
            Some(Value::Array(values)) => !values.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }
}

impl fmt::Display for JsonRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display {
            Some(display) => f.write_str(&SimpleRenderer::plain().render(display, &self.context())),
            None => write!(f, "{} #{}", self.content_type, self.id),
        }
    }
}

impl Content for JsonRecord {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).map(FieldValue::from)
    }

    fn embed(&self, attribute: &str, options: &EmbedOptions) -> smartlinks_core::Result<String> {
        if let Some(template) = self.embeds.get(attribute) {
            let context = options
                .positional
                .iter()
                .enumerate()
                .map(|(position, value)| (position.to_string(), value))
                .chain(options.named.iter().map(|(name, value)| (name.clone(), value)))
                .fold(self.context(), |context, (name, value)| {
                    context.with_text(name, value.as_str())
                });
            return Ok(RENDERER.render(template, &context));
        }

        match self.fields.get(attribute) {
            Some(value) if options.is_empty() => Ok(RENDERER.render(
                &Template::new("{{ value }}"),
                &TemplateContext::new().with_text("value", FieldValue::from(value).to_text()),
            )),
            Some(_) => Err(SmartlinkError::Embed {
                attribute: attribute.to_string(),
                reason: "fields take no options".into(),
            }),
            None => Err(SmartlinkError::Embed {
                attribute: attribute.to_string(),
                reason: format!("no such field or embed on '{}'", self.content_type),
            }),
        }
    }
}

/// Every record of one content type, optionally scoped by a field.
#[derive(Debug)]
pub struct JsonSource {
    schema: ContentSchema,
    records: BTreeMap<ObjectId, Arc<JsonRecord>>,
    scope_field: Option<String>,
}

impl JsonSource {
    pub fn load(type_config: &TypeConfig, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let values: Vec<Value> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array", path.display()))?;
        Self::from_values(type_config, values)
    }

    pub fn from_values(type_config: &TypeConfig, values: Vec<Value>) -> Result<Self> {
        let display = type_config
            .display
            .as_deref()
            .map(|source| Arc::new(Template::new(source)));
        let embeds: Arc<BTreeMap<String, Template>> = Arc::new(
            type_config
                .embeds
                .iter()
                .map(|(name, source)| (name.clone(), Template::new(source.as_str())))
                .collect(),
        );

        let mut records = BTreeMap::new();
        let mut keys = Vec::new();
        for (position, value) in values.into_iter().enumerate() {
            let Value::Object(fields) = value else {
                bail!("record #{} is not a JSON object", position);
            };
            let id = fields
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| anyhow!("record #{} has no numeric id", position))?;
            for key in fields.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }

            let record = JsonRecord {
                content_type: type_config.name.clone(),
                id,
                fields,
                display: display.clone(),
                embeds: embeds.clone(),
            };
            if records.insert(id, Arc::new(record)).is_some() {
                bail!("duplicate id {} in records of '{}'", id, type_config.name);
            }
        }

        let fields = if type_config.fields.is_empty() {
            keys
        } else {
            type_config.fields.clone()
        };
        let schema = embeds.keys().fold(
            ContentSchema::new(type_config.name.as_str()).with_fields(fields),
            |schema, name| schema.with_method(name.as_str(), 0),
        );

        Ok(Self {
            schema,
            records,
            scope_field: type_config.scope_field.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    fn in_scope(&self, record: &JsonRecord) -> bool {
        self.scope_field
            .as_deref()
            .map_or(true, |field| record.is_truthy(field))
    }
}

impl ObjectSource for JsonSource {
    fn schema(&self) -> &ContentSchema {
        &self.schema
    }

    fn all(&self) -> smartlinks_core::Result<Vec<Arc<dyn Content>>> {
        Ok(self
            .records
            .values()
            .filter(|record| self.in_scope(record))
            .map(|record| Arc::clone(record) as Arc<dyn Content>)
            .collect())
    }

    fn get(&self, id: ObjectId) -> smartlinks_core::Result<Option<Arc<dyn Content>>> {
        Ok(self
            .records
            .get(&id)
            .map(|record| Arc::clone(record) as Arc<dyn Content>))
    }

    fn filter_by_id(&self, id: ObjectId) -> smartlinks_core::Result<Option<Arc<dyn Content>>> {
        Ok(self
            .records
            .get(&id)
            .filter(|record| self.in_scope(record))
            .map(|record| Arc::clone(record) as Arc<dyn Content>))
    }
}
