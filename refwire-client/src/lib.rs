pub mod client;
pub mod config;
pub mod error;
mod hydrate;
pub mod logging;
pub mod store;

pub use client::Client;
pub use config::{ClientConfig, UnknownFieldPolicy};
pub use error::{ClientError, Result};
pub use store::ResourceStore;

pub use refwire_core::{
    downcast, Entity, EntityRef, FieldMap, FieldSpec, FieldType, HydrateError, KeyCase,
    MemoryCache, ObjectCache, PropertyBag, ResolveError, Resource, ResourceDescriptor,
    ResourceUri, Value,
};
pub use refwire_transport::{FetchOptions, Method, Transport, TransportError};
#[cfg(feature = "http")]
pub use refwire_transport::{HttpTransport, HttpTransportConfig};
