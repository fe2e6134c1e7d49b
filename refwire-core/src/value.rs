use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Number, Value as JsonValue};
use std::sync::Arc;

use crate::entity::{downcast, Entity, EntityRef};
use crate::error::HydrateError;
use crate::uri::ResourceUri;

/// Wire key that marks a full entity body.
pub const URI_KEY: &str = "$uri";
/// Wire key of a reference stub.
pub const REF_KEY: &str = "$ref";
/// Wire key of a date marker.
pub const DATE_KEY: &str = "$date";

/// A hydrated value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Entity(EntityRef),
    /// A reference left unresolved because resolving it would wait on a
    /// request that is itself waiting on the current one.
    Reference(ResourceUri),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Entity(_) => "entity",
            Value::Reference(_) => "reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Concrete entity of type `T`, if this value holds one.
    pub fn entity<T: Entity>(&self) -> Option<Arc<T>> {
        self.as_entity().and_then(downcast::<T>)
    }

    /// URI of an entity or unresolved reference.
    pub fn entity_uri(&self) -> Option<&ResourceUri> {
        match self {
            Value::Entity(entity) => Some(entity.uri()),
            Value::Reference(uri) => Some(uri),
            _ => None,
        }
    }
}

/// Decodes the payload of a `$date` marker.
pub fn decode_date(millis: &JsonValue) -> Result<DateTime<Utc>, HydrateError> {
    let invalid = || HydrateError::InvalidDate {
        value: millis.to_string(),
    };
    let ms = match millis.as_i64() {
        Some(ms) => ms,
        None => {
            let f = millis.as_f64().ok_or_else(invalid)?;
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(invalid());
            }
            f as i64
        }
    };
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(invalid)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // entities compare by identity
            (Value::Entity(a), Value::Entity(b)) => Arc::ptr_eq(a, b),
            (Value::Reference(a), Value::Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<EntityRef> for Value {
    fn from(entity: EntityRef) -> Self {
        Value::Entity(entity)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Ordered host-named properties handed to a resource constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    props: IndexMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.props.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    /// Removes and returns a property, keeping the order of the rest.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.props.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.props
    }

    fn required(&self, key: &str) -> Result<&Value, HydrateError> {
        match self.props.get(key) {
            Some(Value::Null) | None => Err(HydrateError::missing(key)),
            Some(value) => Ok(value),
        }
    }

    fn mismatch(key: &str, expected: &'static str, found: &Value) -> HydrateError {
        HydrateError::UnexpectedFieldType {
            field: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn str(&self, key: &str) -> Result<&str, HydrateError> {
        let value = self.required(key)?;
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(key, "string", value))
    }

    /// Like [`PropertyBag::str`] but a missing or null field is `None`.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, HydrateError> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.str(key).map(Some),
        }
    }

    pub fn i64(&self, key: &str) -> Result<i64, HydrateError> {
        let value = self.required(key)?;
        value
            .as_i64()
            .ok_or_else(|| Self::mismatch(key, "integer", value))
    }

    pub fn f64(&self, key: &str) -> Result<f64, HydrateError> {
        let value = self.required(key)?;
        value
            .as_f64()
            .ok_or_else(|| Self::mismatch(key, "number", value))
    }

    pub fn bool(&self, key: &str) -> Result<bool, HydrateError> {
        let value = self.required(key)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mismatch(key, "bool", value))
    }

    pub fn date(&self, key: &str) -> Result<DateTime<Utc>, HydrateError> {
        let value = self.required(key)?;
        value
            .as_date()
            .copied()
            .ok_or_else(|| Self::mismatch(key, "date", value))
    }

    pub fn opt_date(&self, key: &str) -> Result<Option<DateTime<Utc>>, HydrateError> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.date(key).map(Some),
        }
    }

    /// Entity of concrete type `T`.
    pub fn entity<T: Entity>(&self, key: &str) -> Result<Arc<T>, HydrateError> {
        let value = self.required(key)?;
        value
            .entity::<T>()
            .ok_or_else(|| Self::mismatch(key, "entity", value))
    }
}

impl FromIterator<(String, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            props: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.into_iter()
    }
}
