//! Synchronous provider adapter for protocol servers.
//!
//! A protocol server asks for the node at a request path, then for its
//! children or its content. Each call runs one async resolution on the
//! background executor and blocks the calling worker thread until it ends.
//!
//! Ordinary browsing misses (NotFound, AmbiguousEntry, hidden-file probes)
//! come back as `Ok(None)`. Backend failures come back as errors and are
//! logged with the request path.

use std::sync::Arc;

use rusty_bags_storage::{ByteRange, ByteStream};

use crate::backends::Backends;
use crate::content::ContentReader;
use crate::error::VfsError;
use crate::executor::AsyncExecutor;
use crate::node::{BagFileNode, DisplayInfo, NodeKind, PathNode};
use crate::options::VfsOptions;
use crate::resolver::Resolver;

/// State shared by the provider and every node it hands out.
///
/// Futures submitted to the executor capture this, never the executor itself,
/// so the executor is always dropped on a caller thread.
struct Shared {
    backends: Backends,
    resolver: Resolver,
}

/// Entry point for a protocol server: maps request paths to resource nodes.
pub struct BagProvider {
    shared: Arc<Shared>,
    executor: Arc<AsyncExecutor>,
    read_chunk_size: usize,
}

impl BagProvider {
    /// Create a provider with its own background executor.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    /// * `options` - Browser options
    pub fn new(backends: Backends, options: VfsOptions) -> Result<Self, VfsError> {
        let executor: AsyncExecutor = AsyncExecutor::new(options.executor.clone())?;
        tracing::info!(
            worker_threads = options.executor.worker_threads,
            hide_dot_files = options.hide_dot_files,
            "bag provider started"
        );
        Ok(Self {
            read_chunk_size: options.read_chunk_size,
            shared: Arc::new(Shared {
                backends,
                resolver: Resolver::new(options),
            }),
            executor: Arc::new(executor),
        })
    }

    /// Get the options.
    pub fn options(&self) -> &VfsOptions {
        self.shared.resolver.options()
    }

    /// Resolve a request path.
    ///
    /// # Arguments
    /// * `path` - Slash-separated request path, e.g. `/space/id/v1/data/a.txt`
    ///
    /// # Returns
    /// The node, `None` if the path does not resolve, or the backend failure.
    pub fn get_resource_node(&self, path: &str) -> Result<Option<ResourceNode>, VfsError> {
        let node: ResourceNode = ResourceNode {
            node: PathNode::Root,
            path: "/".to_string(),
            shared: self.shared.clone(),
            executor: self.executor.clone(),
            read_chunk_size: self.read_chunk_size,
        };
        node.resolve(path)
    }
}

impl std::fmt::Debug for BagProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BagProvider")
            .field("options", self.options())
            .finish_non_exhaustive()
    }
}

/// A resolved node, bound to the provider that produced it.
#[derive(Clone)]
pub struct ResourceNode {
    node: PathNode,
    path: String,
    shared: Arc<Shared>,
    executor: Arc<AsyncExecutor>,
    read_chunk_size: usize,
}

impl ResourceNode {
    /// Get the request path of this node (normalized, starting with `/`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the last path segment (empty for the root).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Get the underlying tree node.
    pub fn node(&self) -> &PathNode {
        &self.node
    }

    /// Get the node kind.
    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// Check if the node has children.
    pub fn is_collection(&self) -> bool {
        self.node.is_collection()
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        self.node.display_info()
    }

    /// List child names in listing order, without hidden names.
    pub fn list_child_names(&self) -> Result<Vec<String>, VfsError> {
        if !self.node.is_collection() {
            return Err(VfsError::NotACollection(self.path.clone()));
        }

        let shared: Arc<Shared> = self.shared.clone();
        let node: PathNode = self.node.clone();
        let result: Result<Vec<String>, VfsError> = self
            .executor
            .block_on(async move { node.child_names(&shared.backends).await })?;

        let options: &VfsOptions = self.shared.resolver.options();
        let names: Vec<String> = self.log_failure(result)?;
        Ok(names.into_iter().filter(|name| !options.is_hidden(name)).collect())
    }

    /// Resolve one child by name.
    ///
    /// # Arguments
    /// * `name` - Child name
    ///
    /// # Returns
    /// The child, or `None` if it does not exist.
    pub fn get_child(&self, name: &str) -> Result<Option<ResourceNode>, VfsError> {
        if name.is_empty() || name.contains('/') {
            tracing::debug!("invalid child name {:?} under {}", name, self.path);
            return Ok(None);
        }
        self.resolve(name)
    }

    /// Get the content length, with a metadata-only request.
    pub fn content_length(&self) -> Result<u64, VfsError> {
        let shared: Arc<Shared> = self.shared.clone();
        let file: BagFileNode = self.file_node()?;
        let result: Result<u64, VfsError> = self
            .executor
            .block_on(async move { file.content_length(&shared.backends).await })?;
        self.log_failure(result)
    }

    /// Get the content type guessed from the file name.
    pub fn content_type(&self) -> Result<String, VfsError> {
        Ok(self.file_node()?.content_type().to_string())
    }

    /// Open the whole content for reading.
    pub fn open_content(&self) -> Result<ContentReader, VfsError> {
        self.open(None)
    }

    /// Open part of the content for reading.
    ///
    /// # Arguments
    /// * `offset` - First byte
    /// * `length` - Number of bytes (truncated at the end of the file)
    pub fn open_range(&self, offset: u64, length: u64) -> Result<ContentReader, VfsError> {
        self.open(Some(ByteRange::new(offset, length)))
    }

    /// Deleting is not supported; bags are immutable.
    pub fn delete(&self) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    /// Moving is not supported; bags are immutable.
    pub fn move_to(&self, _destination: &str) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    /// Copying within the tree is not supported; bags are immutable.
    pub fn copy_to(&self, _destination: &str) -> Result<(), VfsError> {
        Err(VfsError::ReadOnly)
    }

    fn file_node(&self) -> Result<BagFileNode, VfsError> {
        self.node
            .as_file()
            .cloned()
            .ok_or_else(|| VfsError::NotAFile(self.path.clone()))
    }

    fn open(&self, range: Option<ByteRange>) -> Result<ContentReader, VfsError> {
        let shared: Arc<Shared> = self.shared.clone();
        let file: BagFileNode = self.file_node()?;
        let location: String = format!("s3://{}/{}", file.bucket(), file.key());

        let result: Result<ByteStream, VfsError> = self.executor.block_on(async move {
            match range {
                Some(range) => file.open_range(&shared.backends, range).await,
                None => file.open_content(&shared.backends).await,
            }
        })?;

        let stream: ByteStream = self.log_failure(result)?;
        Ok(ContentReader::new(
            self.executor.clone(),
            stream,
            self.read_chunk_size,
            location,
        ))
    }

    fn resolve(&self, relative: &str) -> Result<Option<ResourceNode>, VfsError> {
        let shared: Arc<Shared> = self.shared.clone();
        let start: PathNode = self.node.clone();
        let owned: String = relative.to_string();

        let result: Result<PathNode, VfsError> = self.executor.block_on(async move {
            shared
                .resolver
                .resolve(&shared.backends, start, &owned)
                .await
        })?;

        let path: String = join_path(&self.path, relative);
        match result {
            Ok(node) => Ok(Some(ResourceNode {
                node,
                path,
                shared: self.shared.clone(),
                executor: self.executor.clone(),
                read_chunk_size: self.read_chunk_size,
            })),
            Err(e) if e.is_miss() => {
                tracing::debug!("{} does not resolve: {}", path, e);
                Ok(None)
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "resolution failed");
                Err(e)
            }
        }
    }

    fn log_failure<T>(&self, result: Result<T, VfsError>) -> Result<T, VfsError> {
        if let Err(e) = &result {
            if e.is_miss() {
                tracing::debug!("{}: {}", self.path, e);
            } else {
                tracing::error!(
                    path = %self.path,
                    kind = ?self.node.kind(),
                    error = %e,
                    "operation failed"
                );
            }
        }
        result
    }
}

impl std::fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceNode")
            .field("path", &self.path)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Join a normalized base path and a relative path, dropping empty segments.
fn join_path(base: &str, relative: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(relative.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
