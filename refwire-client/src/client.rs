// refwire client engine
// Turns tagged-JSON REST responses into live entities:
// - Cache lookups before any network call
// - Coalescing of concurrent requests for the same URI
// - Hydration of embedded entities, references and dates
// - Mutations (update/save/destroy) through the same hydration path

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use refwire_core::{
    Dehydrator, Entity, EntityRef, MemoryCache, NamingConvention, ObjectCache, PropertyBag,
    Registry, RequestGraph, Resource, ResourceDescriptor, Value,
};
use refwire_transport::{FetchOptions, Method, Transport};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

type FetchFuture = BoxFuture<'static, Result<Value>>;
type PendingFetch = Shared<FetchFuture>;

/// State shared by every clone of a [`Client`].
pub(crate) struct Engine {
    pub(crate) config: ClientConfig,
    pub(crate) naming: NamingConvention,
    pub(crate) registry: Registry,
    transport: Arc<dyn Transport>,
    pub(crate) cache: Option<Arc<dyn ObjectCache>>,
    /// In-flight GETs by URI. An entry lives until its entity is hydrated
    /// and cached.
    pending: DashMap<String, PendingFetch>,
    /// Which in-flight URI is waiting on which.
    graph: Mutex<RequestGraph>,
}

/// Removes a wait edge when the waiting future completes or is dropped.
struct WaitGuard<'a> {
    graph: &'a Mutex<RequestGraph>,
    waiter: &'a str,
    target: &'a str,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.graph
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_dependency(self.waiter, self.target);
    }
}

impl Engine {
    fn cached(&self, uri: &str) -> Option<EntityRef> {
        self.cache.as_ref()?.get(uri)
    }

    /// Registers `waiter -> target` unless the edge would close a cycle.
    fn wait_on<'a>(&'a self, waiter: &'a str, target: &'a str) -> Option<WaitGuard<'a>> {
        let mut graph = self.graph.lock().unwrap_or_else(PoisonError::into_inner);
        if graph.would_create_cycle(waiter, target) {
            return None;
        }
        graph.add_dependency(waiter, target);
        Some(WaitGuard {
            graph: &self.graph,
            waiter,
            target,
        })
    }

    /// GET with cache lookup and in-flight coalescing.
    ///
    /// `waiter` is the in-flight URI whose hydration needs this one. When
    /// waiting would deadlock, the reference is returned unresolved.
    pub(crate) async fn request(
        self: &Arc<Self>,
        uri: &str,
        options: FetchOptions,
        waiter: Option<&str>,
    ) -> Result<Value> {
        if let Some(entity) = self.cached(uri) {
            debug!(uri, "cache hit");
            return Ok(Value::Entity(entity));
        }

        let _guard = match waiter {
            Some(waiter) => match self.wait_on(waiter, uri) {
                Some(guard) => Some(guard),
                None => {
                    debug!(waiter, uri, "reference cycle, leaving back-edge unresolved");
                    return Ok(Value::Reference(self.registry.parse(uri)?.uri));
                }
            },
            None => None,
        };

        let pending = match self.pending.entry(uri.to_string()) {
            Entry::Occupied(entry) => {
                debug!(uri, "joining in-flight request");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let fetch = self.start_fetch(uri, options);
                entry.insert(fetch.clone());
                fetch
            }
        };

        pending.await
    }

    fn start_fetch(self: &Arc<Self>, uri: &str, mut options: FetchOptions) -> PendingFetch {
        options.method = Method::Get;
        let engine = Arc::clone(self);
        let uri = uri.to_string();

        let fetch: FetchFuture = async move {
            let outcome = engine.fetch_and_hydrate(&uri, options).await;
            if outcome.is_ok() || !engine.config.retain_failed_requests {
                engine.pending.remove(&uri);
                trace!(uri = %uri, "pending entry cleared");
            } else {
                warn!(uri = %uri, "request failed, keeping pending entry");
            }
            outcome
        }
        .boxed();

        fetch.shared()
    }

    async fn fetch_and_hydrate(self: &Arc<Self>, uri: &str, options: FetchOptions) -> Result<Value> {
        debug!(uri, "fetching");
        let body = self.transport.fetch(uri, options).await?;
        self.hydrate(body, Some(uri)).await
    }

    async fn mutate(self: &Arc<Self>, uri: &str, options: FetchOptions) -> Result<Value> {
        debug!(uri, method = %options.method, "sending mutation");
        let body = self.transport.fetch(uri, options).await?;
        self.hydrate(body, None).await
    }
}

/// Client for one REST API.
///
/// Owns the resource registry, the optional object cache and the ledger of
/// in-flight requests. Cloning is cheap and clones share all state.
#[derive(Clone)]
pub struct Client {
    engine: Arc<Engine>,
}

impl Client {
    /// Client with an in-memory cache when `config.use_cache` is set.
    pub fn new<T: Transport + 'static>(config: ClientConfig, transport: T) -> Self {
        let cache = config.use_cache.then(MemoryCache::shared);
        Self::with_cache(config, transport, cache)
    }

    /// Client with a caller-supplied cache, or none.
    pub fn with_cache<T: Transport + 'static>(
        config: ClientConfig,
        transport: T,
        cache: Option<Arc<dyn ObjectCache>>,
    ) -> Self {
        let engine = Engine {
            naming: config.naming(),
            registry: Registry::new(config.base_path.clone()),
            config,
            transport: Arc::new(transport),
            cache,
            pending: DashMap::new(),
            graph: Mutex::new(RequestGraph::new()),
        };
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Client over HTTP rooted at `base_url`.
    #[cfg(feature = "http")]
    pub fn http(config: ClientConfig, base_url: &str) -> Result<Self> {
        let transport = refwire_transport::HttpTransport::new_with_url(base_url)?;
        Ok(Self::new(config, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.engine.config
    }

    pub fn registry(&self) -> &Registry {
        &self.engine.registry
    }

    pub fn cache(&self) -> Option<&Arc<dyn ObjectCache>> {
        self.engine.cache.as_ref()
    }

    pub fn register<R: Resource>(&self) -> Result<()> {
        Ok(self.engine.registry.register_resource::<R>()?)
    }

    pub fn register_descriptor(&self, descriptor: ResourceDescriptor) -> Result<()> {
        Ok(self.engine.registry.register(descriptor)?)
    }

    /// Fetches and hydrates `uri`, serving it from the cache or from an
    /// in-flight request for the same URI when possible.
    pub async fn get(&self, uri: &str) -> Result<Value> {
        self.get_with(uri, FetchOptions::default()).await
    }

    /// Like [`Client::get`], passing extra options to the transport. The
    /// method is always GET.
    pub async fn get_with(&self, uri: &str, options: FetchOptions) -> Result<Value> {
        self.engine.request(uri, options, None).await
    }

    /// Fetches `uri` and downcasts the result to `R`.
    pub async fn get_entity<R: Entity>(&self, uri: &str) -> Result<Arc<R>> {
        let value = self.get(uri).await?;
        value
            .entity::<R>()
            .ok_or_else(|| ClientError::UnexpectedValue {
                uri: uri.to_string(),
                expected: std::any::type_name::<R>().to_string(),
                found: value.type_name(),
            })
    }

    /// Resolves an unresolved back-edge left by cycle detection. Any other
    /// value is returned as is.
    pub async fn resolve(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Reference(uri) => self.get(uri.as_str()).await,
            other => Ok(other.clone()),
        }
    }

    /// Hydrates JSON obtained elsewhere.
    pub async fn hydrate(&self, json: JsonValue) -> Result<Value> {
        self.engine.hydrate(json, None).await
    }

    /// Wire form of a host value.
    pub fn dehydrate(&self, value: &Value) -> JsonValue {
        Dehydrator::new(&self.engine.naming).value(value)
    }

    fn body_for(&self, uri: &str, data: &PropertyBag) -> JsonValue {
        let descriptor = self.engine.registry.lookup(uri);
        Dehydrator::new(&self.engine.naming).properties(data, descriptor.as_deref())
    }

    /// PUTs `data` to the entity's URI and hydrates the response.
    pub async fn update(&self, entity: &dyn Entity, data: &PropertyBag) -> Result<Value> {
        let uri = entity.uri().as_str();
        let options = FetchOptions::new(Method::Put).with_data(self.body_for(uri, data));
        self.engine.mutate(uri, options).await
    }

    /// POSTs `data` to a collection URI and hydrates the response.
    pub async fn save(&self, root_uri: &str, data: &PropertyBag) -> Result<Value> {
        let options = FetchOptions::new(Method::Post).with_data(self.body_for(root_uri, data));
        self.engine.mutate(root_uri, options).await
    }

    /// DELETEs the entity and evicts it from the cache on success.
    pub async fn destroy(&self, entity: &dyn Entity) -> Result<Value> {
        let uri = entity.uri().as_str();
        let outcome = self
            .engine
            .mutate(uri, FetchOptions::new(Method::Delete))
            .await;
        // the server accepted the delete unless the transport failed
        if !matches!(outcome, Err(ClientError::Transport(_))) {
            self.evict(uri);
        }
        outcome
    }

    pub fn evict(&self, uri: &str) {
        if let Some(cache) = &self.engine.cache {
            debug!(uri, "evicting");
            cache.clear(uri);
        }
    }

    /// Number of requests currently in flight.
    pub fn pending_requests(&self) -> usize {
        self.engine.pending.len()
    }

    pub fn is_pending(&self, uri: &str) -> bool {
        self.engine.pending.contains_key(uri)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.engine.config)
            .field("resources", &self.engine.registry.prefixes())
            .field("cache", &self.engine.cache)
            .field("pending", &self.engine.pending.len())
            .finish_non_exhaustive()
    }
}
