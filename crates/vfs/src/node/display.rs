//! Descriptive metadata reported for every node.

use serde::Serialize;

/// Kind of a node in the bag tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// `/`
    Root,
    /// `/{space}`
    Space,
    /// `/{space}/{identifier}`
    ExternalIdentifier,
    /// `/{space}/{identifier}/v{N}`
    Version,
    /// A directory inside a bag.
    Directory,
    /// A file inside a bag.
    File,
}

/// Serializable description of a node, for directory listings and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Node kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Space name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    /// Unescaped external identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_identifier: Option<String>,
    /// Bag version label (`vN`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Logical path within the bag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bag_path: Option<String>,
}

impl DisplayInfo {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            space: None,
            external_identifier: None,
            version: None,
            bag_path: None,
        }
    }
}
