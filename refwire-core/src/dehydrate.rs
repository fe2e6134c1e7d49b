//! Serialization path: host values back to wire JSON.

use serde_json::{json, Map, Value as JsonValue};

use crate::naming::NamingConvention;
use crate::registry::ResourceDescriptor;
use crate::value::{PropertyBag, Value, DATE_KEY, REF_KEY};

/// Turns hydrated values into request bodies.
///
/// Entities and unresolved references become `{"$ref": uri}`, dates become
/// `{"$date": millis}` and object keys are renamed host to wire.
#[derive(Debug, Clone, Copy)]
pub struct Dehydrator<'a> {
    naming: &'a NamingConvention,
}

impl<'a> Dehydrator<'a> {
    pub fn new(naming: &'a NamingConvention) -> Self {
        Self { naming }
    }

    pub fn value(&self, value: &Value) -> JsonValue {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(date) => json!({ DATE_KEY: date.timestamp_millis() }),
            Value::Array(items) => JsonValue::Array(items.iter().map(|v| self.value(v)).collect()),
            Value::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (self.naming.to_wire(k).into_owned(), self.value(v)))
                    .collect(),
            ),
            Value::Entity(entity) => json!({ REF_KEY: entity.uri().as_str() }),
            Value::Reference(uri) => json!({ REF_KEY: uri.as_str() }),
        }
    }

    /// Body for a create or update of `descriptor`'s resource type.
    ///
    /// Read-only fields are dropped and explicit wire names take precedence
    /// over the naming convention.
    pub fn properties(&self, props: &PropertyBag, descriptor: Option<&ResourceDescriptor>) -> JsonValue {
        let mut body = Map::new();
        for (key, value) in props.iter() {
            let wire_key = match descriptor {
                Some(d) if d.is_read_only(key) => continue,
                Some(d) => d
                    .wire_name_for(key)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.naming.to_wire(key).into_owned()),
                None => self.naming.to_wire(key).into_owned(),
            };
            body.insert(wire_key, self.value(value));
        }
        JsonValue::Object(body)
    }
}
