//! Read-through cache wrapper honoring the invalidation contract.
//!
//! Reads are served from an LRU cache keyed by normalized
//! `{kind}/{name}` keys. Every create/update invalidates the list key
//! and the affected entity key synchronously, before the write reaches
//! the inner store, so no stale entry can outlive a write.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;

use dramasync_core::drama::{DramaDraft, DramaIndex, DramaRecord};
use dramasync_core::keys::{entity_key, list_key};

use crate::{RecordStore, StoreError, WriteOutcome};

/// Default number of cached entries (list + entities).
const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Clone)]
enum CacheEntry {
    List(Vec<DramaIndex>),
    Record(DramaRecord),
}

/// A [`RecordStore`] decorator serving reads through an LRU cache.
pub struct CachedStore<S> {
    inner: S,
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl<S: RecordStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Whether a cache entry currently exists for `key`.
    ///
    /// Exposed so the invalidation contract is observable in tests and
    /// diagnostics; does not touch LRU recency.
    pub fn is_cached(&self, key: &str) -> bool {
        self.lock_cache().peek(key).is_some()
    }

    /// Drop the list key and the entity key for `name`.
    fn invalidate(&self, name: &str) {
        let mut cache = self.lock_cache();
        cache.pop(&list_key());
        cache.pop(&entity_key(name));
        tracing::debug!(key = %entity_key(name), "Cache invalidated");
    }

    fn cache_put(&self, key: String, entry: CacheEntry) {
        self.lock_cache().put(key, entry);
    }

    fn cache_get(&self, key: &str) -> Option<CacheEntry> {
        self.lock_cache().get(key).cloned()
    }

    /// Cache entries are always safe to rebuild, so a poisoned lock is
    /// recovered rather than propagated.
    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for CachedStore<S> {
    async fn list(&self) -> Result<Vec<DramaIndex>, StoreError> {
        let key = list_key();
        if let Some(CacheEntry::List(index)) = self.cache_get(&key) {
            return Ok(index);
        }

        let index = self.inner.list().await?;
        self.cache_put(key, CacheEntry::List(index.clone()));
        Ok(index)
    }

    async fn get(&self, name: &str) -> Result<Option<DramaRecord>, StoreError> {
        let key = entity_key(name);
        if let Some(CacheEntry::Record(record)) = self.cache_get(&key) {
            return Ok(Some(record));
        }

        let record = self.inner.get(name).await?;
        if let Some(record) = &record {
            self.cache_put(key, CacheEntry::Record(record.clone()));
        }
        Ok(record)
    }

    async fn create(&self, draft: DramaDraft) -> Result<WriteOutcome, StoreError> {
        self.invalidate(&draft.name);
        self.inner.create(draft).await
    }

    async fn update(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<WriteOutcome, StoreError> {
        self.invalidate(name);
        // A rename also dirties the entry under the new name.
        if let Some(new_name) = patch.get("name").and_then(|v| v.as_str()) {
            if new_name != name {
                self.invalidate(new_name);
            }
        }
        self.inner.update(name, patch).await
    }
}
