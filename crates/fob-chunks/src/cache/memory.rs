use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CacheResult, CachedItem, ContentCache, ETag};

/// Counters collected by [`MemoryCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

/// Process-local cache backed by a `DashMap`.
///
/// Suited for watch mode, where the same plugin instance sees many
/// compilations. Concurrent entry tasks touch distinct keys, so the sharded
/// map never serializes them.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: DashMap<String, (ETag, CachedItem)>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// ETag currently stored for a key.
    pub fn etag_for(&self, key: &str) -> Option<ETag> {
        self.slots.get(key).map(|slot| slot.0.clone())
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn get(&self, key: &str, etag: &ETag) -> CacheResult<Option<CachedItem>> {
        let item = self
            .slots
            .get(key)
            .filter(|slot| &slot.0 == etag)
            .map(|slot| slot.1.clone());

        let counter = if item.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);

        Ok(item)
    }

    async fn store(&self, key: &str, etag: &ETag, item: CachedItem) -> CacheResult<()> {
        self.slots.insert(key.to_string(), (etag.clone(), item));
        self.stores.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
