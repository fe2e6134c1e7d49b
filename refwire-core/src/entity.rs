use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HydrateError;
use crate::registry::FieldMap;
use crate::uri::ResourceUri;
use crate::value::PropertyBag;

/// Conversion to `Any` for shared entities, so callers can recover the
/// concrete resource type from an [`EntityRef`].
pub trait AsAny: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A hydrated, identity-bearing object.
pub trait Entity: AsAny + fmt::Debug {
    fn uri(&self) -> &ResourceUri;
}

/// Shared handle to a hydrated entity. The object cache and every value
/// that references the entity hold clones of the same `Arc`.
pub type EntityRef = Arc<dyn Entity>;

/// A resource type that can be registered and built by the hydrator.
pub trait Resource: Entity + Sized {
    /// URI prefix the resource lives under, e.g. `/user`.
    const PREFIX: &'static str;

    /// Declared fields keyed by host name. An empty map accepts any field.
    fn fields() -> FieldMap {
        FieldMap::new()
    }

    fn from_properties(uri: ResourceUri, props: PropertyBag) -> Result<Self, HydrateError>;
}

/// Recovers the concrete type behind a shared entity.
pub fn downcast<T: Entity>(entity: &EntityRef) -> Option<Arc<T>> {
    Arc::clone(entity).into_any_arc().downcast::<T>().ok()
}

/// Short type name used in logs and errors.
pub(crate) fn resource_name<T>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;

    #[derive(Debug)]
    struct Tag {
        uri: ResourceUri,
    }

    impl Entity for Tag {
        fn uri(&self) -> &ResourceUri {
            &self.uri
        }
    }

    #[derive(Debug)]
    #[allow(dead_code)]
    struct Other {
        uri: ResourceUri,
    }

    impl Entity for Other {
        fn uri(&self) -> &ResourceUri {
            &self.uri
        }
    }

    fn uri(raw: &str) -> ResourceUri {
        let registry = Registry::default();
        registry
            .register(crate::ResourceDescriptor::new("/tag", "Tag", |uri, _| {
                Ok(Arc::new(Tag { uri }))
            }))
            .unwrap();
        registry.parse(raw).unwrap().uri
    }

    #[test]
    fn test_downcast_to_concrete_type() {
        let entity: EntityRef = Arc::new(Tag { uri: uri("/tag/1") });
        let tag = downcast::<Tag>(&entity).unwrap();
        assert_eq!(tag.uri().as_str(), "/tag/1");
        assert!(downcast::<Other>(&entity).is_none());
    }

    #[test]
    fn test_downcast_keeps_identity() {
        let entity: EntityRef = Arc::new(Tag { uri: uri("/tag/2") });
        let tag = downcast::<Tag>(&entity).unwrap();
        let original = Arc::as_ptr(&entity) as *const ();
        assert_eq!(Arc::as_ptr(&tag) as *const (), original);
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name::<Tag>(), "Tag");
    }
}
