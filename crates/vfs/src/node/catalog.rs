//! Nodes backed by the search index: spaces and external identifiers.

use rusty_bags_model::{escape_identifier, unescape_identifier, BagVersion};

use crate::backends::Backends;
use crate::error::VfsError;
use crate::node::bag::BagPathNode;
use crate::node::display::{DisplayInfo, NodeKind};

/// List every space, sorted.
pub(crate) async fn list_spaces(backends: &Backends) -> Result<Vec<String>, VfsError> {
    let mut spaces: Vec<String> = backends
        .index
        .list_spaces()
        .await
        .map_err(|e| VfsError::backend("spaces", e))?;
    spaces.sort();
    spaces.dedup();
    Ok(spaces)
}

/// `/{space}`: lists the escaped external identifiers of the space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpaceNode {
    space: String,
}

impl SpaceNode {
    /// Create a space node.
    pub fn new(space: impl Into<String>) -> Self {
        Self {
            space: space.into(),
        }
    }

    /// Get the space name.
    pub fn space(&self) -> &str {
        &self.space
    }

    /// List external identifiers, escaped for use as path segments, sorted.
    ///
    /// Identifiers the codec cannot represent are skipped.
    pub async fn child_names(&self, backends: &Backends) -> Result<Vec<String>, VfsError> {
        let identifiers: Vec<String> = backends
            .index
            .list_external_identifiers(&self.space)
            .await
            .map_err(|e| VfsError::backend(format!("identifiers in space {}", self.space), e))?;

        let mut names: Vec<String> = Vec::with_capacity(identifiers.len());
        for identifier in &identifiers {
            match escape_identifier(identifier) {
                Ok(escaped) => names.push(escaped.into_owned()),
                Err(e) => {
                    tracing::warn!(space = %self.space, "skipping identifier: {}", e);
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Produce the identifier node for an escaped segment.
    ///
    /// # Arguments
    /// * `name` - Escaped identifier segment
    pub fn child(&self, name: &str) -> IdentifierNode {
        IdentifierNode::new(self.space.clone(), unescape_identifier(name).into_owned())
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            space: Some(self.space.clone()),
            ..DisplayInfo::new(NodeKind::Space)
        }
    }
}

/// `/{space}/{identifier}`: lists the versions of a bag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifierNode {
    space: String,
    external_identifier: String,
}

impl IdentifierNode {
    /// Create an identifier node.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    pub fn new(space: impl Into<String>, external_identifier: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            external_identifier: external_identifier.into(),
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

    /// List `v1..vN` in numeric order, where N is the latest indexed version.
    ///
    /// Versions are assumed dense. An identifier the index does not know is
    /// NotFound.
    pub async fn child_names(&self, backends: &Backends) -> Result<Vec<String>, VfsError> {
        let coordinates: String = format!("{}/{}", self.space, self.external_identifier);
        let latest: Option<BagVersion> = backends
            .index
            .latest_version(&self.space, &self.external_identifier)
            .await
            .map_err(|e| VfsError::backend(format!("latest version of {}", coordinates), e))?;

        match latest {
            Some(latest) => Ok(BagVersion::up_to(latest).map(|v| v.to_string()).collect()),
            None => Err(VfsError::not_found(coordinates)),
        }
    }

    /// Produce the version node for a `vN` segment.
    ///
    /// # Arguments
    /// * `name` - Version label
    pub fn child(&self, name: &str) -> Result<BagPathNode, VfsError> {
        let version: BagVersion = BagVersion::parse(name).map_err(|_| {
            VfsError::not_found(format!("{}/{}/{}", self.space, self.external_identifier, name))
        })?;
        Ok(BagPathNode::new(
            self.space.clone(),
            self.external_identifier.clone(),
            version,
            String::new(),
        ))
    }

    /// Describe this node.
    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            space: Some(self.space.clone()),
            external_identifier: Some(self.external_identifier.clone()),
            ..DisplayInfo::new(NodeKind::ExternalIdentifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_bags_model::ESCAPED_SEPARATOR;
    use rusty_bags_storage::{MemoryBagSource, MemoryMetadataIndex, MemoryObjectStore};
    use std::sync::Arc;

    fn backends(index: MemoryMetadataIndex) -> Backends {
        Backends::new(
            Arc::new(index),
            Arc::new(MemoryBagSource::new()),
            Arc::new(MemoryObjectStore::new()),
        )
    }

    #[tokio::test]
    async fn test_spaces_sorted() {
        let index: MemoryMetadataIndex = MemoryMetadataIndex::new();
        index.insert("testing", "a", BagVersion::FIRST);
        index.insert("digitised", "b", BagVersion::FIRST);

        let spaces: Vec<String> = list_spaces(&backends(index)).await.unwrap();
        assert_eq!(spaces, vec!["digitised", "testing"]);
    }

    #[tokio::test]
    async fn test_identifiers_escaped_and_sorted() {
        let index: MemoryMetadataIndex = MemoryMetadataIndex::new();
        index.insert("s1", "foo/bar", BagVersion::FIRST);
        index.insert("s1", "b1234", BagVersion::FIRST);
        index.insert("s1", "bad\u{29F8}id", BagVersion::FIRST);

        let names: Vec<String> = SpaceNode::new("s1").child_names(&backends(index)).await.unwrap();

        let escaped: String = format!("foo{}bar", ESCAPED_SEPARATOR);
        assert_eq!(names, vec!["b1234".to_string(), escaped.clone()]);

        let child: IdentifierNode = SpaceNode::new("s1").child(&escaped);
        assert_eq!(child.external_identifier(), "foo/bar");
    }

    #[tokio::test]
    async fn test_versions_numeric_order() {
        let index: MemoryMetadataIndex = MemoryMetadataIndex::new();
        index.insert("s", "id", BagVersion::new(11).unwrap());

        let names: Vec<String> = IdentifierNode::new("s", "id")
            .child_names(&backends(index))
            .await
            .unwrap();

        let expected: Vec<String> = (1..=11).map(|n| format!("v{}", n)).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let result = IdentifierNode::new("s", "nope")
            .child_names(&backends(MemoryMetadataIndex::new()))
            .await;
        assert!(matches!(result, Err(VfsError::NotFound { .. })));
    }

    #[test]
    fn test_version_child_parsing() {
        let node: IdentifierNode = IdentifierNode::new("s", "id");
        assert_eq!(node.child("v3").unwrap().version(), BagVersion::new(3).unwrap());
        assert!(matches!(node.child("3"), Err(VfsError::NotFound { .. })));
        assert!(matches!(node.child("v0"), Err(VfsError::NotFound { .. })));
    }
}
