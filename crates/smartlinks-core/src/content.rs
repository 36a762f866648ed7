//! The boundary with the host's object store.
//!
//! Content types expose their attributes through [`Content::get_field`]
//! instead of reflection, and describe themselves with a [`ContentSchema`]
//! so configurations can be checked when they are registered.

use crate::error::{Result, SmartlinkError};
use crate::types::ObjectId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Pseudo-field resolving to the object's primary key.
pub const PK_FIELD: &str = "pk";

/// Pseudo-field resolving to the object's default string representation.
pub const DISPLAY_FIELD: &str = "to_string";

/// Options parsed from an embed, passed verbatim (unconverted) to the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Bare options, in encounter order.
    pub positional: Vec<String>,
    /// `key=value` options.
    pub named: BTreeMap<String, String>,
}

impl EmbedOptions {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// A content object that smartlinks can point at.
///
/// `Display` is the default string representation, reachable in field-sets
/// through the [`DISPLAY_FIELD`] pseudo-field and in templates as `{{ object }}`.
pub trait Content: fmt::Display + fmt::Debug + Send + Sync {
    /// Primary key, unique within the content type.
    fn id(&self) -> ObjectId;

    /// Value of an attribute or of a zero-argument method.
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// Invoke an embeddable attribute. Only ever called for attributes on the
    /// configuration's allow-list.
    fn embed(&self, attribute: &str, options: &EmbedOptions) -> Result<String> {
        let _ = options;
        Err(SmartlinkError::Embed {
            attribute: attribute.to_string(),
            reason: "content type has no embeddable attributes".into(),
        })
    }
}

/// A value read from a content object.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// A related object; further path segments are read from it.
    Object(Arc<dyn Content>),
    /// A mapping; further path segments are keys into it.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Follow one path segment.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        match self {
            FieldValue::Object(object) => field(object.as_ref(), name),
            FieldValue::Map(map) => map.get(name).cloned(),
            _ => None,
        }
    }

    /// Text used when the value is concatenated into a search key or
    /// substituted into a template. `Null` and maps render empty.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Null | FieldValue::Map(_) => String::new(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::Integer(value) => value.to_string(),
            FieldValue::Float(value) => value.to_string(),
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Object(object) => object.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<Arc<dyn Content>> for FieldValue {
    fn from(value: Arc<dyn Content>) -> Self {
        FieldValue::Object(value)
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(_) => FieldValue::Text(value.to_string()),
            Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Read a single field from an object, honouring the pseudo-fields.
pub fn field(content: &dyn Content, name: &str) -> Option<FieldValue> {
    match name {
        PK_FIELD => Some(FieldValue::Text(content.id().to_string())),
        DISPLAY_FIELD => Some(FieldValue::Text(content.to_string())),
        _ => content.get_field(name),
    }
}

/// Follow a dot-separated field path (`person.name`) from `content`.
///
/// Lookups stop at the first absent value and yield `Null`.
pub fn resolve_path(content: &dyn Content, path: &str) -> FieldValue {
    let mut segments = path.split('.');
    let mut value = match segments.next().and_then(|first| field(content, first)) {
        Some(value) => value,
        None => return FieldValue::Null,
    };

    for segment in segments {
        if value.is_null() {
            break;
        }
        value = value.get(segment).unwrap_or(FieldValue::Null);
    }

    value
}

/// Kind of a member declared by a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A stored attribute.
    Field,
    /// A computed attribute and the number of arguments it requires
    /// besides the receiver.
    Method { required_args: usize },
}

/// Description of a content type: its name and its members.
#[derive(Debug, Clone)]
pub struct ContentSchema {
    name: String,
    members: BTreeMap<String, Member>,
}

impl ContentSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into(), Member::Field);
        self
    }

    pub fn with_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.members.insert(name.into(), Member::Field);
        }
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, required_args: usize) -> Self {
        self.members
            .insert(name.into(), Member::Method { required_args });
        self
    }

    /// Content type name; used as the `content_type` column of index rows.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self, name: &str) -> Option<Member> {
        self.members.get(name).copied()
    }
}

/// Where a configuration finds its objects.
pub trait ObjectSource: Send + Sync {
    fn schema(&self) -> &ContentSchema;

    /// Every object in scope.
    fn all(&self) -> Result<Vec<Arc<dyn Content>>>;

    /// Fetch by primary key, ignoring scope.
    fn get(&self, id: ObjectId) -> Result<Option<Arc<dyn Content>>>;

    /// Fetch by primary key, only if the object is in scope.
    fn filter_by_id(&self, id: ObjectId) -> Result<Option<Arc<dyn Content>>> {
        self.get(id)
    }
}

type ScopePredicate = Arc<dyn Fn(&dyn Content) -> bool + Send + Sync>;

/// In-memory object source, optionally scoped by a predicate
/// (e.g. "only public objects may be linked").
pub struct MemorySource {
    schema: ContentSchema,
    objects: RwLock<BTreeMap<ObjectId, Arc<dyn Content>>>,
    scope: Option<ScopePredicate>,
}

impl MemorySource {
    pub fn new(schema: ContentSchema) -> Self {
        Self {
            schema,
            objects: RwLock::new(BTreeMap::new()),
            scope: None,
        }
    }

    pub fn with_scope<F>(mut self, scope: F) -> Self
    where
        F: Fn(&dyn Content) -> bool + Send + Sync + 'static,
    {
        self.scope = Some(Arc::new(scope));
        self
    }

    /// Insert or replace an object, returning the previous version.
    pub fn insert(&self, object: Arc<dyn Content>) -> Result<Option<Arc<dyn Content>>> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| SmartlinkError::Source("Object source lock poisoned".into()))?;
        Ok(objects.insert(object.id(), object))
    }

    pub fn remove(&self, id: ObjectId) -> Result<Option<Arc<dyn Content>>> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| SmartlinkError::Source("Object source lock poisoned".into()))?;
        Ok(objects.remove(&id))
    }

    fn in_scope(&self, object: &dyn Content) -> bool {
        self.scope.as_ref().map_or(true, |scope| scope(object))
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("content_type", &self.schema.name())
            .field("scoped", &self.scope.is_some())
            .finish()
    }
}

impl ObjectSource for MemorySource {
    fn schema(&self) -> &ContentSchema {
        &self.schema
    }

    fn all(&self) -> Result<Vec<Arc<dyn Content>>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| SmartlinkError::Source("Object source lock poisoned".into()))?;
        Ok(objects
            .values()
            .filter(|object| self.in_scope(object.as_ref()))
            .cloned()
            .collect())
    }

    fn get(&self, id: ObjectId) -> Result<Option<Arc<dyn Content>>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| SmartlinkError::Source("Object source lock poisoned".into()))?;
        Ok(objects.get(&id).cloned())
    }

    fn filter_by_id(&self, id: ObjectId) -> Result<Option<Arc<dyn Content>>> {
        Ok(self.get(id)?.filter(|object| self.in_scope(object.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Person {
        id: ObjectId,
        name: String,
    }

    impl fmt::Display for Person {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "person {}", self.name)
        }
    }

    impl Content for Person {
        fn id(&self) -> ObjectId {
            self.id
        }

        fn get_field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "name" => Some(self.name.as_str().into()),
                _ => None,
            }
        }
    }

    #[derive(Debug)]
    struct Professor {
        id: ObjectId,
        position: String,
        person: Option<Arc<dyn Content>>,
    }

    impl fmt::Display for Professor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.position)
        }
    }

    impl Content for Professor {
        fn id(&self) -> ObjectId {
            self.id
        }

        fn get_field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "position" => Some(self.position.as_str().into()),
                "person" => Some(self.person.clone().into()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_resolve_path_follows_objects() {
        let person: Arc<dyn Content> = Arc::new(Person { id: 3, name: "Ada".into() });
        let professor = Professor {
            id: 7,
            position: "Dean".into(),
            person: Some(person),
        };

        assert_eq!(resolve_path(&professor, "position").to_text(), "Dean");
        assert_eq!(resolve_path(&professor, "person.name").to_text(), "Ada");
        assert_eq!(resolve_path(&professor, "person.pk").to_text(), "3");
        assert_eq!(resolve_path(&professor, "person").to_text(), "person Ada");
        assert_eq!(resolve_path(&professor, "pk").to_text(), "7");
        assert_eq!(resolve_path(&professor, "to_string").to_text(), "Dean");
    }

    #[test]
    fn test_resolve_path_stops_at_absent_values() {
        let professor = Professor {
            id: 1,
            position: "Janitor".into(),
            person: None,
        };

        assert!(resolve_path(&professor, "person.name").is_null());
        assert!(resolve_path(&professor, "salary").is_null());
        assert_eq!(resolve_path(&professor, "person.name").to_text(), "");
    }

    #[test]
    fn test_json_values_convert() {
        let value = serde_json::json!({"title": "Mad Max", "year": 1984, "meta": {"slug": "mad-max"}});
        let converted = FieldValue::from(&value);
        assert_eq!(converted.get("title").unwrap().to_text(), "Mad Max");
        assert_eq!(converted.get("year").unwrap().to_text(), "1984");
        assert_eq!(
            converted.get("meta").and_then(|m| m.get("slug")).unwrap().to_text(),
            "mad-max"
        );
    }

    #[test]
    fn test_memory_source_scope() {
        let source = MemorySource::new(ContentSchema::new("person").with_field("name"))
            .with_scope(|object| object.id() % 2 == 0);
        source.insert(Arc::new(Person { id: 1, name: "Odd".into() })).unwrap();
        source.insert(Arc::new(Person { id: 2, name: "Even".into() })).unwrap();

        assert_eq!(source.all().unwrap().len(), 1);
        assert!(source.filter_by_id(1).unwrap().is_none());
        assert!(source.get(1).unwrap().is_some());
        assert!(source.filter_by_id(2).unwrap().is_some());

        source.remove(2).unwrap();
        assert!(source.all().unwrap().is_empty());
    }
}
