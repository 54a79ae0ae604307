//! Nodes inside a bag: versions, directories and files.

use std::sync::Arc;

use rusty_bags_model::{Bag, BagVersion};
use rusty_bags_storage::{ByteRange, ByteStream, ObjectMetadata};

use crate::backends::Backends;
use crate::error::VfsError;
use crate::indexer::{DirectoryIndex, Lookup};
use crate::node::display::{DisplayInfo, NodeKind};
use crate::options::CollisionPolicy;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A directory level inside one bag version.
///
/// The version root is the level with an empty prefix. Only coordinates are
/// held; the bag is fetched (through the memoizing source) and indexed on
/// every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BagPathNode {
    space: String,
    external_identifier: String,
    version: BagVersion,
    prefix: String,
}

impl BagPathNode {
    /// Create a bag path node.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    /// * `version` - Bag version
    /// * `prefix` - Directory prefix within the bag, empty or ending in `/`
    pub fn new(
        space: impl Into<String>,
        external_identifier: impl Into<String>,
        version: BagVersion,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            space: space.into(),
            external_identifier: external_identifier.into(),
            version,
            prefix: prefix.into(),
        }
    }

    /// Get the space name.
    pub fn space(&self) -> &str {
        &self.space
    }

    /// Get the unescaped external identifier.
    pub fn external_identifier(&self) -> &str {
        &self.external_identifier
    }

    /// Get the bag version.
    pub fn version(&self) -> BagVersion {
        self.version
    }

    /// Get the directory prefix (empty at the version root).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Check if this is the version root.
    pub fn is_version_root(&self) -> bool {
        self.prefix.is_empty()
    }

    fn coordinates(&self) -> String {
        format!("{}/{}/{}", self.space, self.external_identifier, self.version)
    }

    async fn load(&self, backends: &Backends) -> Result<(Arc<Bag>, DirectoryIndex), VfsError> {
        let bag: Arc<Bag> = backends
            .bags
            .get_bag(&self.space, &self.external_identifier, self.version)
            .await
            .map_err(|e| VfsError::bag_fetch(self.coordinates(), e))?;
        let index: DirectoryIndex = DirectoryIndex::build(bag.entries(), &self.prefix)?;
        Ok((bag, index))
    }

    /// List subdirectories and files at this level, sorted.
    pub async fn child_names(&self, backends: &Backends) -> Result<Vec<String>, VfsError> {
        let (_, index) = self.load(backends).await?;
        Ok(index.names())
    }

    /// Produce the child node for a name.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    /// * `name` - Child name
    /// * `policy` - How to resolve a file/directory collision
    pub async fn child(
        &self,
        backends: &Backends,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<BagChild, VfsError> {
        let (bag, index) = self.load(backends).await?;

        match index.lookup(name) {
            Lookup::Directory => Ok(BagChild::Directory(self.descend(name))),
            Lookup::File(path) => Ok(BagChild::File(self.file(&bag, name, path))),
            Lookup::Both(_) => match policy {
                CollisionPolicy::DirectoryWins => {
                    tracing::debug!(
                        "{}: {} is both a file and a directory, using the directory",
                        self.coordinates(),
                        name
                    );
                    Ok(BagChild::Directory(self.descend(name)))
                }
                CollisionPolicy::Reject => Err(VfsError::AmbiguousEntry {
                    prefix: self.prefix.clone(),
                    name: name.to_string(),
                }),
            },
            Lookup::Missing => Err(VfsError::not_found(format!(
                "{}/{}{}",
                self.coordinates(),
                self.prefix,
                name
            ))),
        }
    }

    fn descend(&self, name: &str) -> BagPathNode {
        BagPathNode {
            prefix: format!("{}{}/", self.prefix, name),
            ..self.clone()
        }
    }

    fn file(&self, bag: &Bag, name: &str, storage_path: &str) -> BagFileNode {
        BagFileNode {
            space: self.space.clone(),
            external_identifier: self.external_identifier.clone(),
            version: self.version,
            name: format!("{}{}", self.prefix, name),
            bucket: bag.location.bucket.clone(),
            key: bag.location.object_key(storage_path),
        }
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        let kind: NodeKind = if self.is_version_root() {
            NodeKind::Version
        } else {
            NodeKind::Directory
        };
        DisplayInfo {
            space: Some(self.space.clone()),
            external_identifier: Some(self.external_identifier.clone()),
            version: Some(self.version.to_string()),
            bag_path: Some(self.prefix.clone()),
            ..DisplayInfo::new(kind)
        }
    }
}

/// A child of a bag directory level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagChild {
    /// A deeper directory level.
    Directory(BagPathNode),
    /// A file.
    File(BagFileNode),
}

/// A file inside a bag, addressed by its blob storage location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BagFileNode {
    space: String,
    external_identifier: String,
    version: BagVersion,
    name: String,
    bucket: String,
    key: String,
}

impl BagFileNode {
    /// Get the logical path of the file within the bag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the file's basename.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Get the bucket holding the file.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the object key of the file.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Get the content length with a metadata-only request.
    pub async fn content_length(&self, backends: &Backends) -> Result<u64, VfsError> {
        let metadata: ObjectMetadata = backends
            .objects
            .head_object(&self.bucket, &self.key)
            .await
            .map_err(|e| VfsError::backend(self.location(), e))?;
        Ok(metadata.size)
    }

    /// Guess the content type from the logical file name.
    pub fn content_type(&self) -> &'static str {
        mime_guess::from_path(self.file_name())
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Stream the whole file.
    pub async fn open_content(&self, backends: &Backends) -> Result<ByteStream, VfsError> {
        backends
            .objects
            .get_object(&self.bucket, &self.key)
            .await
            .map_err(|e| VfsError::backend(self.location(), e))
    }

    /// Stream part of the file.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    /// * `range` - Bytes to read
    pub async fn open_range(
        &self,
        backends: &Backends,
        range: ByteRange,
    ) -> Result<ByteStream, VfsError> {
        backends
            .objects
            .get_object_range(&self.bucket, &self.key, range)
            .await
            .map_err(|e| VfsError::backend(self.location(), e))
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            space: Some(self.space.clone()),
            external_identifier: Some(self.external_identifier.clone()),
            version: Some(self.version.to_string()),
            bag_path: Some(self.name.clone()),
            ..DisplayInfo::new(NodeKind::File)
        }
    }
}
