//! Path resolution over the virtual bag tree.

use crate::backends::Backends;
use crate::error::VfsError;
use crate::node::PathNode;
use crate::options::VfsOptions;

/// Walks a request path segment by segment from a starting node.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: VfsOptions,
}

impl Resolver {
    /// Create a resolver.
    ///
    /// # Arguments
    /// * `options` - Hidden-file and collision handling
    pub fn new(options: VfsOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &VfsOptions {
        &self.options
    }

    /// Resolve a path relative to `start`.
    ///
    /// Empty segments are dropped, so `/`, `` and `//` resolve to `start`.
    /// At each step the segment must appear in the current node's child
    /// names; comparison is exact on the decoded segment.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    /// * `start` - Node to resolve from (usually `PathNode::Root`)
    /// * `path` - Slash-separated path
    ///
    /// # Returns
    /// The final node, or `NotFound` if any segment does not resolve.
    pub async fn resolve(
        &self,
        backends: &Backends,
        start: PathNode,
        path: &str,
    ) -> Result<PathNode, VfsError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Checked before any backend call so client probes cost nothing.
        if let Some(hidden) = segments.iter().find(|s| self.options.is_hidden(s)) {
            tracing::debug!("hidden segment {:?} in {}", hidden, path);
            return Err(VfsError::not_found(path));
        }

        let mut node: PathNode = start;
        for segment in segments {
            if !node.is_collection() {
                return Err(VfsError::not_found(path));
            }

            let names: Vec<String> = node.child_names(backends).await?;
            if !names.iter().any(|name| name == segment) {
                return Err(VfsError::not_found(path));
            }

            node = node
                .child(backends, segment, self.options.collision_policy)
                .await?;
            tracing::trace!("resolved {:?} to {:?}", segment, node.kind());
        }

        Ok(node)
    }
}
