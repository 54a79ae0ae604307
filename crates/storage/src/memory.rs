//! In-memory backends for testing and demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::RwLock;
use rusty_bags_model::{Bag, BagVersion};

use crate::cache::BagKey;
use crate::error::StorageError;
use crate::search::DEFAULT_MAX_RESULTS;
use crate::traits::{BagSource, ByteRange, ByteStream, MetadataIndex, ObjectMetadata, ObjectStore};

/// In-memory search index: space -> external identifier -> latest version.
#[derive(Debug)]
pub struct MemoryMetadataIndex {
    bags: RwLock<BTreeMap<String, BTreeMap<String, BagVersion>>>,
    max_results: usize,
}

impl MemoryMetadataIndex {
    /// Create an empty index with the default result cap.
    pub fn new() -> Self {
        Self {
            bags: RwLock::new(BTreeMap::new()),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Set the identifier listing cap.
    ///
    /// # Arguments
    /// * `max_results` - Maximum identifiers returned per space
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Record a bag and its latest version.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    /// * `latest` - Latest version
    pub fn insert(&self, space: &str, external_identifier: &str, latest: BagVersion) {
        self.bags
            .write()
            .entry(space.to_string())
            .or_default()
            .insert(external_identifier.to_string(), latest);
    }
}

impl Default for MemoryMetadataIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataIndex for MemoryMetadataIndex {
    async fn list_spaces(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.bags.read().keys().cloned().collect())
    }

    async fn list_external_identifiers(&self, space: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .bags
            .read()
            .get(space)
            .map(|ids| ids.keys().take(self.max_results).cloned().collect())
            .unwrap_or_default())
    }

    async fn latest_version(
        &self,
        space: &str,
        external_identifier: &str,
    ) -> Result<Option<BagVersion>, StorageError> {
        Ok(self
            .bags
            .read()
            .get(space)
            .and_then(|ids| ids.get(external_identifier))
            .copied())
    }
}

/// In-memory bag source that counts fetches.
#[derive(Debug, Default)]
pub struct MemoryBagSource {
    bags: RwLock<HashMap<BagKey, Arc<Bag>>>,
    fetches: AtomicU64,
}

impl MemoryBagSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a bag.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    /// * `version` - Bag version
    /// * `bag` - Bag document
    pub fn insert(&self, space: &str, external_identifier: &str, version: BagVersion, bag: Bag) {
        self.bags.write().insert(
            BagKey::new(space, external_identifier, version),
            Arc::new(bag),
        );
    }

    /// Number of `get_bag` calls served, including misses.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BagSource for MemoryBagSource {
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let key: BagKey = BagKey::new(space, external_identifier, version);
        self.bags
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("bag {}", key)))
    }
}

/// In-memory blob store.
///
/// Bodies are streamed in chunks of `chunk_size` bytes so callers see the
/// same multi-chunk behavior as a network body.
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Bytes>>,
    chunk_size: usize,
    head_requests: AtomicU64,
    get_requests: AtomicU64,
}

impl MemoryObjectStore {
    /// Default streaming chunk size.
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            head_requests: AtomicU64::new(0),
            get_requests: AtomicU64::new(0),
        }
    }

    /// Set the streaming chunk size.
    ///
    /// # Arguments
    /// * `chunk_size` - Bytes per streamed chunk (0 is treated as 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Store an object.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    /// * `data` - Object body
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .write()
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Number of HEAD requests served.
    pub fn head_count(&self) -> u64 {
        self.head_requests.load(Ordering::Relaxed)
    }

    /// Number of GET requests served (whole or ranged).
    pub fn get_count(&self) -> u64 {
        self.get_requests.load(Ordering::Relaxed)
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("s3://{}/{}", bucket, key)))
    }

    fn stream(&self, data: Bytes) -> ByteStream {
        let chunk_size: usize = self.chunk_size;
        let chunks: Vec<Result<Bytes, StorageError>> = (0..data.len())
            .step_by(chunk_size)
            .map(|start| Ok(data.slice(start..(start + chunk_size).min(data.len()))))
            .collect();
        futures::stream::iter(chunks).boxed()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError> {
        self.head_requests.fetch_add(1, Ordering::Relaxed);
        let data: Bytes = self.lookup(bucket, key)?;
        Ok(ObjectMetadata {
            size: data.len() as u64,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError> {
        self.get_requests.fetch_add(1, Ordering::Relaxed);
        let data: Bytes = self.lookup(bucket, key)?;
        Ok(self.stream(data))
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<ByteStream, StorageError> {
        self.get_requests.fetch_add(1, Ordering::Relaxed);
        let data: Bytes = self.lookup(bucket, key)?;
        let len: u64 = data.len() as u64;
        let start: usize = range.offset.min(len) as usize;
        let end: usize = range.end().min(len) as usize;
        Ok(self.stream(data.slice(start..end)))
    }
}
