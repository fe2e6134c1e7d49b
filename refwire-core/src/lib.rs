pub mod cache;
pub mod dehydrate;
pub mod entity;
pub mod error;
pub mod graph;
pub mod naming;
pub mod registry;
pub mod uri;
pub mod value;

pub use cache::{MemoryCache, ObjectCache};
pub use dehydrate::Dehydrator;
pub use entity::{downcast, AsAny, Entity, EntityRef, Resource};
pub use error::{HydrateError, ResolveError};
pub use graph::RequestGraph;
pub use naming::{KeyCase, NamingConvention};
pub use registry::{Constructor, FieldMap, FieldSpec, FieldType, Registry, Resolved, ResourceDescriptor};
pub use uri::ResourceUri;
pub use value::{decode_date, PropertyBag, Value, DATE_KEY, REF_KEY, URI_KEY};
