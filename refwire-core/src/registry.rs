// Resource registry and URI resolver.
//
// The registry is an explicit value owned by one client instance. Prefix
// order is significant: the resolver returns the first registered prefix
// that matches, so re-registering a prefix replaces its binding in place
// without moving it.

use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::entity::{resource_name, EntityRef, Resource};
use crate::error::{HydrateError, ResolveError};
use crate::uri::ResourceUri;
use crate::value::{PropertyBag, Value};

/// Expected shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Any,
    String,
    Number,
    Bool,
    Date,
    Entity,
    Array,
    Object,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Entity => "entity",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Null is accepted by every type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Any, _) | (_, Value::Null) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Date, Value::Date(_)) => true,
            (FieldType::Entity, Value::Entity(_) | Value::Reference(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

/// Per-field metadata supplied at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    /// Explicit wire spelling. Overrides the naming convention both ways.
    pub wire_name: Option<String>,
    /// Read-only fields are never sent back to the server.
    pub read_only: bool,
    pub type_hint: FieldType,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(type_hint: FieldType) -> Self {
        Self {
            type_hint,
            ..Self::default()
        }
    }

    pub fn wire(mut self, name: impl Into<String>) -> Self {
        self.wire_name = Some(name.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Declared fields keyed by host name.
pub type FieldMap = IndexMap<String, FieldSpec>;

pub type Constructor =
    Arc<dyn Fn(ResourceUri, PropertyBag) -> Result<EntityRef, HydrateError> + Send + Sync>;

/// Binding of a URI prefix to a constructible entity type.
#[derive(Clone)]
pub struct ResourceDescriptor {
    prefix: String,
    name: String,
    fields: FieldMap,
    constructor: Constructor,
}

impl ResourceDescriptor {
    pub fn new<F>(prefix: impl Into<String>, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(ResourceUri, PropertyBag) -> Result<EntityRef, HydrateError> + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.into(),
            name: name.into(),
            fields: FieldMap::new(),
            constructor: Arc::new(constructor),
        }
    }

    /// Descriptor for a [`Resource`] implementation.
    pub fn of<T: Resource>() -> Self {
        Self::new(T::PREFIX, resource_name::<T>(), |uri, props| {
            let entity: EntityRef = Arc::new(T::from_properties(uri, props)?);
            Ok(entity)
        })
        .with_fields(T::fields())
    }

    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_field(mut self, host_name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(host_name.into(), spec);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn declares_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn field(&self, host_name: &str) -> Option<&FieldSpec> {
        self.fields.get(host_name)
    }

    /// Host name of a field declared with an explicit wire name.
    pub fn host_name_for(&self, wire_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, spec)| spec.wire_name.as_deref() == Some(wire_name))
            .map(|(host, _)| host.as_str())
    }

    pub fn wire_name_for(&self, host_name: &str) -> Option<&str> {
        self.fields.get(host_name)?.wire_name.as_deref()
    }

    pub fn is_read_only(&self, host_name: &str) -> bool {
        self.fields.get(host_name).is_some_and(|spec| spec.read_only)
    }

    pub fn construct(&self, uri: ResourceUri, props: PropertyBag) -> Result<EntityRef, HydrateError> {
        (self.constructor)(uri, props)
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("prefix", &self.prefix)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a URI.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub descriptor: Arc<ResourceDescriptor>,
    pub uri: ResourceUri,
}

/// Prefix-to-descriptor mapping shared by the resolver and the hydrator.
#[derive(Debug, Default)]
pub struct Registry {
    base_path: String,
    resources: RwLock<IndexMap<String, Arc<ResourceDescriptor>>>,
}

impl Registry {
    /// Registry whose URIs may carry a global `base_path` (e.g. `/api`).
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            resources: RwLock::new(IndexMap::new()),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Binds a prefix to a descriptor. Registering the same prefix again
    /// replaces the binding and keeps its original position.
    pub fn register(&self, descriptor: ResourceDescriptor) -> Result<(), ResolveError> {
        let prefix = descriptor.prefix().to_string();
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(ResolveError::InvalidPrefix { prefix });
        }
        debug!(prefix = %prefix, resource = descriptor.name(), "registering resource");
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prefix, Arc::new(descriptor));
        Ok(())
    }

    pub fn register_resource<T: Resource>(&self) -> Result<(), ResolveError> {
        self.register(ResourceDescriptor::of::<T>())
    }

    pub fn descriptor(&self, prefix: &str) -> Option<Arc<ResourceDescriptor>> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(prefix)
            .cloned()
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> Vec<String> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn strip_base<'a>(&self, uri: &'a str) -> &'a str {
        if self.base_path.is_empty() {
            return uri;
        }
        uri.strip_prefix(self.base_path.as_str()).unwrap_or(uri)
    }

    /// Classifies an entity URI.
    ///
    /// The global base path is stripped when present, then the first
    /// registered prefix `p` for which the rest of the path starts with
    /// `p/` wins. The remainder after `p/` is split on `/` into parameters.
    pub fn parse(&self, uri: &str) -> Result<Resolved, ResolveError> {
        let path = self.strip_base(uri);
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        for (prefix, descriptor) in resources.iter() {
            let Some(rest) = path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            else {
                continue;
            };
            let params = rest.split('/').map(str::to_string).collect();
            return Ok(Resolved {
                descriptor: Arc::clone(descriptor),
                uri: ResourceUri::new(uri, prefix, params),
            });
        }
        Err(ResolveError::unknown_resource(uri))
    }

    /// Descriptor for a collection URI (`/user`) or an entity URI
    /// (`/user/5`). Used by the serialization path, where a miss is not an
    /// error.
    pub fn lookup(&self, uri: &str) -> Option<Arc<ResourceDescriptor>> {
        let path = self.strip_base(uri);
        if let Some(descriptor) = self.descriptor(path) {
            return Some(descriptor);
        }
        self.parse(uri).ok().map(|resolved| resolved.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[derive(Debug)]
    struct User {
        uri: ResourceUri,
        first_name: String,
    }

    impl Entity for User {
        fn uri(&self) -> &ResourceUri {
            &self.uri
        }
    }

    impl Resource for User {
        const PREFIX: &'static str = "/user";

        fn fields() -> FieldMap {
            FieldMap::from([
                ("firstName".to_string(), FieldSpec::typed(FieldType::String)),
                ("id".to_string(), FieldSpec::typed(FieldType::Number).read_only()),
            ])
        }

        fn from_properties(uri: ResourceUri, props: PropertyBag) -> Result<Self, HydrateError> {
            Ok(User {
                uri,
                first_name: props.str("firstName")?.to_string(),
            })
        }
    }

    fn named(prefix: &str, name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(prefix, name, |_, _| {
            Err(HydrateError::construct("test", "not constructible"))
        })
    }

    #[test]
    fn test_parse_registered_resource() {
        let registry = Registry::default();
        registry.register_resource::<User>().unwrap();

        let resolved = registry.parse("/user/5").unwrap();
        assert_eq!(resolved.descriptor.name(), "User");
        assert_eq!(resolved.uri.params(), ["5"]);
        assert_eq!(resolved.uri.id().unwrap(), 5);
    }

    #[test]
    fn test_parse_extra_segments() {
        let registry = Registry::default();
        registry.register(named("/user", "User")).unwrap();

        let resolved = registry.parse("/user/5/avatar/large").unwrap();
        assert_eq!(resolved.uri.params(), ["5", "avatar", "large"]);
    }

    #[test]
    fn test_unknown_resource() {
        let registry = Registry::default();
        registry.register(named("/user", "User")).unwrap();

        assert!(registry.parse("/group/1").unwrap_err().is_unknown_resource());
        // the prefix must be followed by a slash
        assert!(registry.parse("/users/1").unwrap_err().is_unknown_resource());
        assert!(registry.parse("/user").unwrap_err().is_unknown_resource());
    }

    #[test]
    fn test_first_registered_prefix_wins() {
        let registry = Registry::default();
        registry.register(named("/org", "Org")).unwrap();
        registry.register(named("/org/1/team", "Team")).unwrap();

        // "/org/1/team/2" also starts with "/org/", and /org came first
        let resolved = registry.parse("/org/1/team/2").unwrap();
        assert_eq!(resolved.descriptor.name(), "Org");
        assert_eq!(resolved.uri.params(), ["1", "team", "2"]);

        let reversed = Registry::default();
        reversed.register(named("/org/1/team", "Team")).unwrap();
        reversed.register(named("/org", "Org")).unwrap();
        assert_eq!(reversed.parse("/org/1/team/2").unwrap().descriptor.name(), "Team");
    }

    #[test]
    fn test_register_is_idempotent_per_prefix() {
        let registry = Registry::default();
        registry.register(named("/a", "A1")).unwrap();
        registry.register(named("/b", "B")).unwrap();
        registry.register(named("/a", "A2")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.prefixes(), vec!["/a", "/b"]);
        assert_eq!(registry.parse("/a/1").unwrap().descriptor.name(), "A2");
    }

    #[test]
    fn test_invalid_prefix() {
        let registry = Registry::default();
        assert!(matches!(
            registry.register(named("user", "User")),
            Err(ResolveError::InvalidPrefix { .. })
        ));
        assert!(registry.register(named("/user/", "User")).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_base_path_is_stripped() {
        let registry = Registry::new("/api/v1");
        registry.register(named("/user", "User")).unwrap();

        let resolved = registry.parse("/api/v1/user/7").unwrap();
        assert_eq!(resolved.uri.as_str(), "/api/v1/user/7");
        assert_eq!(resolved.uri.id().unwrap(), 7);

        // the base path is optional
        assert_eq!(registry.parse("/user/7").unwrap().uri.id().unwrap(), 7);
    }

    #[test]
    fn test_lookup_collection_and_entity() {
        let registry = Registry::new("/api");
        registry.register_resource::<User>().unwrap();

        assert_eq!(registry.lookup("/api/user").unwrap().name(), "User");
        assert_eq!(registry.lookup("/user/3").unwrap().name(), "User");
        assert!(registry.lookup("/group").is_none());
    }

    #[test]
    fn test_field_metadata() {
        let descriptor = ResourceDescriptor::of::<User>()
            .with_field("createdAt", FieldSpec::typed(FieldType::Date).wire("created").read_only());

        assert!(descriptor.declares_fields());
        assert!(descriptor.is_read_only("id"));
        assert!(!descriptor.is_read_only("firstName"));
        assert_eq!(descriptor.host_name_for("created"), Some("createdAt"));
        assert_eq!(descriptor.wire_name_for("createdAt"), Some("created"));
        assert_eq!(descriptor.wire_name_for("firstName"), None);
    }

    #[test]
    fn test_construct_through_descriptor() {
        let registry = Registry::default();
        registry.register_resource::<User>().unwrap();
        let resolved = registry.parse("/user/5").unwrap();

        let props = PropertyBag::new().with("firstName", "Ann");
        let entity = resolved.descriptor.construct(resolved.uri, props).unwrap();
        let user = crate::downcast::<User>(&entity).unwrap();
        assert_eq!(user.first_name, "Ann");
        assert_eq!(entity.uri().as_str(), "/user/5");
    }

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::String.accepts(&Value::from("x")));
        assert!(FieldType::String.accepts(&Value::Null));
        assert!(!FieldType::String.accepts(&Value::from(1i64)));
        assert!(FieldType::Any.accepts(&Value::from(true)));
    }
}
