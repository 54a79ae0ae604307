//! Collaborator interfaces consumed by the bag browser.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use rusty_bags_model::{Bag, BagVersion};

use crate::error::StorageError;

/// Stream of content chunks read from blob storage.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Metadata from a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,
}

/// A byte range within an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte of the range.
    pub offset: u64,
    /// Number of bytes requested.
    pub length: u64,
}

impl ByteRange {
    /// Create a range.
    ///
    /// # Arguments
    /// * `offset` - First byte
    /// * `length` - Number of bytes
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

/// Query interface over the search index of bags.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    /// List every space that has at least one bag.
    async fn list_spaces(&self) -> Result<Vec<String>, StorageError>;

    /// List the external identifiers of bags in a space.
    ///
    /// Results are capped by the implementation; spaces larger than the cap
    /// are listed incompletely.
    ///
    /// # Arguments
    /// * `space` - Space name
    async fn list_external_identifiers(&self, space: &str) -> Result<Vec<String>, StorageError>;

    /// Get the latest version of a bag.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    ///
    /// # Returns
    /// `None` when the index has no bag for the identifier.
    async fn latest_version(
        &self,
        space: &str,
        external_identifier: &str,
    ) -> Result<Option<BagVersion>, StorageError>;
}

/// Read interface over the storage service's bag API.
#[async_trait]
pub trait BagSource: Send + Sync {
    /// Fetch one version of a bag.
    ///
    /// A bag that does not exist is reported as `StorageError::NotFound`.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    /// * `version` - Bag version
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError>;
}

/// Read access to blob storage.
///
/// Implementations own any retry policy; callers propagate failures as-is.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get object metadata without transferring the body.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StorageError>;

    /// Stream the whole object.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, StorageError>;

    /// Stream part of an object.
    ///
    /// A range reaching past the end of the object is truncated to the object.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    /// * `range` - Bytes to read
    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        range: ByteRange,
    ) -> Result<ByteStream, StorageError>;
}

#[async_trait]
impl<T: MetadataIndex + ?Sized> MetadataIndex for Arc<T> {
    async fn list_spaces(&self) -> Result<Vec<String>, StorageError> {
        (**self).list_spaces().await
    }

    async fn list_external_identifiers(&self, space: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_external_identifiers(space).await
    }

    async fn latest_version(
        &self,
        space: &str,
        external_identifier: &str,
    ) -> Result<Option<BagVersion>, StorageError> {
        (**self).latest_version(space, external_identifier).await
    }
}

#[async_trait]
impl<T: BagSource + ?Sized> BagSource for Arc<T> {
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError> {
        (**self).get_bag(space, external_identifier, version).await
    }
}
