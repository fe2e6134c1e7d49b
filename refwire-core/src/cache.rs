use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::entity::EntityRef;

/// Store of hydrated entities keyed by URI.
///
/// The engine only needs these three operations; eviction, bounds and
/// persistence are up to the implementation.
pub trait ObjectCache: Send + Sync + fmt::Debug {
    fn get(&self, uri: &str) -> Option<EntityRef>;

    /// Stores `entity` and returns the instance now held for `uri`.
    fn set(&self, uri: &str, entity: EntityRef) -> EntityRef;

    fn clear(&self, uri: &str);
}

/// Unbounded in-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, EntityRef>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn ObjectCache> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    pub fn clear_all(&self) {
        self.entries.clear();
    }
}

impl ObjectCache for MemoryCache {
    fn get(&self, uri: &str) -> Option<EntityRef> {
        self.entries.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    fn set(&self, uri: &str, entity: EntityRef) -> EntityRef {
        self.entries.insert(uri.to_string(), Arc::clone(&entity));
        entity
    }

    fn clear(&self, uri: &str) {
        self.entries.remove(uri);
    }
}
