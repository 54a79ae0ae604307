//! The virtual bag tree.
//!
//! ```text
//! Root ─► Space ─► Identifier ─► Version ─► Directory* ─► File
//! /       /s       /s/id         /s/id/v1   /s/id/v1/data  /s/id/v1/data/a.txt
//! ```
//!
//! Nodes hold only the coordinates needed to recompute their children, never
//! a subtree, so any node can be rebuilt from its path on every request.

mod bag;
mod catalog;
mod display;

pub use bag::{BagChild, BagFileNode, BagPathNode};
pub use catalog::{IdentifierNode, SpaceNode};
pub use display::{DisplayInfo, NodeKind};

use crate::backends::Backends;
use crate::error::VfsError;
use crate::options::CollisionPolicy;

/// A resolvable position in the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathNode {
    /// `/`, listing spaces.
    Root,
    /// A space, listing escaped external identifiers.
    Space(SpaceNode),
    /// An external identifier, listing versions.
    Identifier(IdentifierNode),
    /// The root level of one bag version.
    Version(BagPathNode),
    /// A directory inside a bag version.
    Directory(BagPathNode),
    /// A file inside a bag version.
    File(BagFileNode),
}

impl PathNode {
    /// Get the node kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            PathNode::Root => NodeKind::Root,
            PathNode::Space(_) => NodeKind::Space,
            PathNode::Identifier(_) => NodeKind::ExternalIdentifier,
            PathNode::Version(_) => NodeKind::Version,
            PathNode::Directory(_) => NodeKind::Directory,
            PathNode::File(_) => NodeKind::File,
        }
    }

    /// Check if the node has children.
    pub fn is_collection(&self) -> bool {
        !matches!(self, PathNode::File(_))
    }

    /// Get the file node, if this is a file.
    pub fn as_file(&self) -> Option<&BagFileNode> {
        match self {
            PathNode::File(file) => Some(file),
            _ => None,
        }
    }

    /// List child names, sorted.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    ///
    /// # Returns
    /// The names, or `NotACollection` for a file.
    pub async fn child_names(&self, backends: &Backends) -> Result<Vec<String>, VfsError> {
        match self {
            PathNode::Root => catalog::list_spaces(backends).await,
            PathNode::Space(space) => space.child_names(backends).await,
            PathNode::Identifier(identifier) => identifier.child_names(backends).await,
            PathNode::Version(node) | PathNode::Directory(node) => node.child_names(backends).await,
            PathNode::File(file) => Err(VfsError::NotACollection(file.name().to_string())),
        }
    }

    /// Produce the child node for a name.
    ///
    /// The name is not checked against `child_names` here; the resolver does
    /// that. Only bag levels need a backend call to tell a file from a
    /// directory.
    ///
    /// # Arguments
    /// * `backends` - Collaborators
    /// * `name` - Child name (escaped, for identifiers)
    /// * `policy` - How to resolve a file/directory collision
    pub async fn child(
        &self,
        backends: &Backends,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<PathNode, VfsError> {
        match self {
            PathNode::Root => Ok(PathNode::Space(SpaceNode::new(name))),
            PathNode::Space(space) => Ok(PathNode::Identifier(space.child(name))),
            PathNode::Identifier(identifier) => Ok(PathNode::Version(identifier.child(name)?)),
            PathNode::Version(node) | PathNode::Directory(node) => {
                match node.child(backends, name, policy).await? {
                    BagChild::Directory(directory) => Ok(PathNode::Directory(directory)),
                    BagChild::File(file) => Ok(PathNode::File(file)),
                }
            }
            PathNode::File(file) => Err(VfsError::NotACollection(file.name().to_string())),
        }
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        match self {
            PathNode::Root => DisplayInfo::new(NodeKind::Root),
            PathNode::Space(space) => space.display_info(),
            PathNode::Identifier(identifier) => identifier.display_info(),
            PathNode::Version(node) | PathNode::Directory(node) => node.display_info(),
            PathNode::File(file) => file.display_info(),
        }
    }
}
