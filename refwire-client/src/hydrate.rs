//! Recursive conversion of tagged JSON into host values.
//!
//! Shapes are handled as follows:
//! - arrays hydrate element-wise and keep their order, whatever order the
//!   nested work finishes in;
//! - an object with `$uri` is an entity body, built through the registered
//!   resource type and stored in the object cache;
//! - `{"$ref": uri}` goes through the full request path, so cache hits and
//!   in-flight coalescing apply;
//! - `{"$date": millis}` becomes a UTC date;
//! - any other object has its keys renamed and values hydrated;
//! - scalars pass through.

use futures::future::{try_join_all, BoxFuture, FutureExt};
use indexmap::IndexMap;
use refwire_core::{
    decode_date, HydrateError, PropertyBag, ResourceDescriptor, Value, DATE_KEY, REF_KEY, URI_KEY,
};
use refwire_transport::FetchOptions;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::client::Engine;
use crate::config::UnknownFieldPolicy;
use crate::error::{ClientError, Result};

fn marker_uri<'v>(marker: &'static str, value: &'v JsonValue) -> std::result::Result<&'v str, HydrateError> {
    value.as_str().ok_or_else(|| HydrateError::InvalidMarker {
        marker,
        found: value.to_string(),
    })
}

/// Host spelling of every wire key, in order. Two wire keys that land on
/// the same host key are an error rather than one value replacing the other.
fn host_keys<'k, K>(
    keys: impl Iterator<Item = (&'k str, K)>,
) -> std::result::Result<Vec<String>, HydrateError>
where
    K: Into<String>,
{
    let mut seen: HashMap<String, &'k str> = HashMap::new();
    let mut out = Vec::new();
    for (wire, host) in keys {
        let host = host.into();
        if let Some(first) = seen.insert(host.clone(), wire) {
            return Err(HydrateError::KeyCollision {
                key: host,
                first: first.to_string(),
                second: wire.to_string(),
            });
        }
        out.push(host);
    }
    Ok(out)
}

impl Engine {
    /// Hydrates `json`. `owner` is the in-flight URI whose body this is,
    /// used to detect reference cycles between pending requests.
    pub(crate) fn hydrate<'a>(
        self: &'a Arc<Self>,
        json: JsonValue,
        owner: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Value>> {
        async move {
            match json {
                JsonValue::Null => Ok(Value::Null),
                JsonValue::Bool(b) => Ok(Value::Bool(b)),
                JsonValue::Number(n) => Ok(Value::Number(n)),
                JsonValue::String(s) => Ok(Value::String(s)),
                JsonValue::Array(items) => {
                    let values =
                        try_join_all(items.into_iter().map(|item| self.hydrate(item, owner))).await?;
                    Ok(Value::Array(values))
                }
                JsonValue::Object(map) => self.hydrate_object(map, owner).await,
            }
        }
        .boxed()
    }

    async fn hydrate_object(
        self: &Arc<Self>,
        map: Map<String, JsonValue>,
        owner: Option<&str>,
    ) -> Result<Value> {
        if let Some(uri) = map.get(URI_KEY) {
            let uri = marker_uri(URI_KEY, uri)?.to_string();
            return self.hydrate_entity(&uri, map, owner).await;
        }

        if map.len() == 1 {
            if let Some(target) = map.get(REF_KEY) {
                let target = marker_uri(REF_KEY, target)?;
                // unknown prefixes fail before any fetch
                self.registry.parse(target)?;
                return self.request(target, FetchOptions::default(), owner).await;
            }
            if let Some(millis) = map.get(DATE_KEY) {
                return Ok(Value::Date(decode_date(millis)?));
            }
        }

        let renamed = host_keys(map.keys().map(|key| (key.as_str(), self.naming.to_host(key))))?;
        let entries = try_join_all(
            renamed
                .into_iter()
                .zip(map.into_iter().map(|(_, value)| value))
                .map(|(key, value)| async move {
                    Ok::<_, ClientError>((key, self.hydrate(value, owner).await?))
                }),
        )
        .await?;
        let object: IndexMap<String, Value> = entries.into_iter().collect();
        Ok(Value::Object(object))
    }

    fn host_key(&self, descriptor: &ResourceDescriptor, wire_key: &str) -> String {
        match descriptor.host_name_for(wire_key) {
            Some(host) => host.to_string(),
            None => self.naming.to_host(wire_key).into_owned(),
        }
    }

    async fn hydrate_entity(
        self: &Arc<Self>,
        uri: &str,
        map: Map<String, JsonValue>,
        owner: Option<&str>,
    ) -> Result<Value> {
        let resolved = self.registry.parse(uri)?;
        let descriptor = resolved.descriptor;

        let fields: Vec<(String, JsonValue)> =
            map.into_iter().filter(|(key, _)| key != URI_KEY).collect();
        let renamed = host_keys(
            fields
                .iter()
                .map(|(key, _)| (key.as_str(), self.host_key(&descriptor, key))),
        )?;
        let pairs = try_join_all(
            renamed
                .into_iter()
                .zip(fields.into_iter().map(|(_, value)| value))
                .map(|(key, value)| async move {
                    Ok::<_, ClientError>((key, self.hydrate(value, owner).await?))
                }),
        )
        .await?;

        let mut props = PropertyBag::new();
        for (key, value) in pairs {
            match descriptor.field(&key) {
                Some(spec) if !spec.type_hint.accepts(&value) => {
                    return Err(HydrateError::UnexpectedFieldType {
                        field: key,
                        expected: spec.type_hint.name(),
                        found: value.type_name(),
                    }
                    .into());
                }
                Some(_) => {}
                None if descriptor.declares_fields() => match self.config.unknown_fields {
                    UnknownFieldPolicy::Ignore => {
                        trace!(resource = descriptor.name(), field = %key, "dropping undeclared field");
                        continue;
                    }
                    UnknownFieldPolicy::Reject => {
                        return Err(HydrateError::UnknownField {
                            resource: descriptor.name().to_string(),
                            field: key,
                        }
                        .into());
                    }
                    UnknownFieldPolicy::Keep => {}
                },
                None => {}
            }
            props.insert(key, value);
        }

        let entity = descriptor.construct(resolved.uri, props)?;
        let entity = match &self.cache {
            Some(cache) => cache.set(uri, entity),
            None => entity,
        };
        trace!(uri, resource = descriptor.name(), "hydrated entity");
        Ok(Value::Entity(entity))
    }
}
