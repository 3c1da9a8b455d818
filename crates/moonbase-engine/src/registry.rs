use std::collections::HashMap;

use moonbase_core::types::Collection;
use tokio::sync::RwLock;

/// The process-wide collection registry: logical schema state shared by
/// every request.
///
/// A single read-write lock governs it: many readers or one writer. Readers
/// take a snapshot (clone) under the reader lock; long-running DDL never
/// happens under the writer lock. The schema manager's mutation order is:
/// snapshot (reader lock), DDL (lock-free), apply (writer lock).
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    inner: RwLock<HashMap<String, Collection>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the registry at startup from reflected physical state.
    pub async fn seed(&self, collections: Vec<Collection>) {
        let mut guard = self.inner.write().await;
        guard.clear();
        for collection in collections {
            guard.insert(collection.name.as_str().to_string(), collection);
        }
    }

    /// Returns a snapshot of one collection.
    pub async fn get(&self, name: &str) -> Option<Collection> {
        self.inner.read().await.get(name).cloned()
    }

    /// Returns true if the collection is registered.
    pub async fn exists(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    /// Returns snapshots of all collections, sorted by name.
    pub async fn list(&self) -> Vec<Collection> {
        let guard = self.inner.read().await;
        let mut collections: Vec<Collection> = guard.values().cloned().collect();
        collections.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        collections
    }

    /// Number of registered collections.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Inserts a new collection. Returns false (and leaves the registry
    /// unchanged) if the name is already taken.
    pub async fn insert(&self, collection: Collection) -> bool {
        let mut guard = self.inner.write().await;
        let key = collection.name.as_str().to_string();
        if guard.contains_key(&key) {
            return false;
        }
        guard.insert(key, collection);
        true
    }

    /// Replaces an existing collection's schema (post-update apply).
    pub async fn replace(&self, collection: Collection) {
        let mut guard = self.inner.write().await;
        guard.insert(collection.name.as_str().to_string(), collection);
    }

    /// Removes a collection, returning its last registered schema.
    pub async fn remove(&self, name: &str) -> Option<Collection> {
        self.inner.write().await.remove(name)
    }
}
