//! Memoization of bag documents.
//!
//! A published bag never changes, so a bag fetched once for a given
//! `(space, external identifier, version)` can be served from memory for as
//! long as the cache keeps it.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use rusty_bags_model::{Bag, BagVersion};

use crate::error::StorageError;
use crate::traits::BagSource;

/// Default number of bags kept in memory.
pub const DEFAULT_BAG_CACHE_CAPACITY: usize = 1024;

/// Cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of bags kept. `None` keeps every bag for the life of the cache.
    pub capacity: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: Some(DEFAULT_BAG_CACHE_CAPACITY),
        }
    }
}

impl CacheSettings {
    /// Settings for a cache that never evicts.
    pub fn unbounded() -> Self {
        Self { capacity: None }
    }

    /// Set the capacity.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of bags (0 is treated as 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Cache key: the exact argument triple of a bag fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BagKey {
    /// Space name.
    pub space: String,
    /// Unescaped external identifier.
    pub external_identifier: String,
    /// Bag version.
    pub version: BagVersion,
}

impl BagKey {
    /// Create a key.
    pub fn new(
        space: impl Into<String>,
        external_identifier: impl Into<String>,
        version: BagVersion,
    ) -> Self {
        Self {
            space: space.into(),
            external_identifier: external_identifier.into(),
            version,
        }
    }
}

impl std::fmt::Display for BagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.space, self.external_identifier, self.version)
    }
}

/// LRU cache of bags.
///
/// Thread-safe via internal mutex. The lock is never held across a fetch, so
/// two callers missing on the same key both fetch and the later insert wins.
pub struct BagCache {
    entries: Mutex<LruCache<BagKey, Arc<Bag>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BagCache {
    /// Create a cache with the given settings.
    ///
    /// # Arguments
    /// * `settings` - Cache sizing
    pub fn new(settings: CacheSettings) -> Self {
        let entries: LruCache<BagKey, Arc<Bag>> = match settings.capacity {
            Some(capacity) => LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a bag, counting the hit or miss.
    ///
    /// # Arguments
    /// * `key` - Bag key
    pub fn get(&self, key: &BagKey) -> Option<Arc<Bag>> {
        let found: Option<Arc<Bag>> = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert or replace a bag.
    ///
    /// # Arguments
    /// * `key` - Bag key
    /// * `bag` - Bag to keep
    pub fn insert(&self, key: BagKey, bag: Arc<Bag>) {
        self.entries.lock().put(key, bag);
    }

    /// Drop one bag from the cache.
    ///
    /// # Returns
    /// True if the key was cached.
    pub fn invalidate(&self, key: &BagKey) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Drop every cached bag.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Get the number of cached bags.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total cache hits.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for BagCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

/// `BagSource` wrapper that memoizes successful fetches.
///
/// Failures are not cached.
pub struct CachingBagSource<S: BagSource> {
    inner: S,
    cache: Arc<BagCache>,
}

impl<S: BagSource> CachingBagSource<S> {
    /// Wrap a bag source.
    ///
    /// # Arguments
    /// * `inner` - Source to fetch from on a miss
    /// * `cache` - Cache to memoize into (may be shared)
    pub fn new(inner: S, cache: Arc<BagCache>) -> Self {
        Self { inner, cache }
    }

    /// Get the cache.
    pub fn cache(&self) -> &Arc<BagCache> {
        &self.cache
    }

    /// Get the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BagSource> BagSource for CachingBagSource<S> {
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError> {
        let key: BagKey = BagKey::new(space, external_identifier, version);

        if let Some(bag) = self.cache.get(&key) {
            tracing::trace!(bag = %key, "bag cache hit");
            return Ok(bag);
        }

        let bag: Arc<Bag> = self.inner.get_bag(space, external_identifier, version).await?;
        tracing::debug!(bag = %key, files = bag.file_count(), "bag fetched");
        self.cache.insert(key, bag.clone());
        Ok(bag)
    }
}
