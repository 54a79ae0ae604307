//! Bag document types.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::version::BagVersion;

/// One entry of a bag manifest or tag manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagFile {
    /// Logical forward-slash path within the bag (e.g. `data/objects/cat.jpg`).
    pub name: String,
    /// Location of the content relative to the bag's blob storage base path.
    pub path: String,
    /// Checksum recorded in the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Size in bytes recorded in the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl BagFile {
    /// Create a manifest entry.
    ///
    /// # Arguments
    /// * `name` - Logical path within the bag
    /// * `path` - Storage path relative to the bag location
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            checksum: None,
            size: None,
        }
    }

    /// Set the recorded size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Flat list of files describing part of a bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagManifest {
    /// Checksum algorithm used by the entries (e.g. `SHA-256`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_algorithm: Option<String>,
    /// Manifest entries.
    #[serde(default)]
    pub files: Vec<BagFile>,
}

impl BagManifest {
    /// Create a manifest from entries.
    pub fn new(files: Vec<BagFile>) -> Self {
        Self {
            checksum_algorithm: None,
            files,
        }
    }
}

/// Where a bag's files live in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagLocation {
    /// Bucket holding the bag.
    pub bucket: String,
    /// Key prefix under which every entry `path` is stored.
    pub path: String,
}

impl BagLocation {
    /// Create a location.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `path` - Base key prefix
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Build the object key for a manifest entry's storage path.
    ///
    /// # Arguments
    /// * `file_path` - The entry's `path` field
    pub fn object_key(&self, file_path: &str) -> String {
        let base: &str = self.path.trim_end_matches('/');
        if base.is_empty() {
            file_path.to_string()
        } else {
            format!("{}/{}", base, file_path.trim_start_matches('/'))
        }
    }
}

/// Descriptive bag metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagInfo {
    /// External identifier the bag was ingested under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_identifier: Option<String>,
}

/// The space a bag belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagSpace {
    /// Space name.
    pub id: String,
}

/// A bag as returned by the storage service.
///
/// Immutable once published, which is what makes it safe to cache for the
/// life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bag {
    /// Payload files.
    pub manifest: BagManifest,
    /// Administrative files (bagit.txt, checksum manifests, ...).
    #[serde(default)]
    pub tag_manifest: BagManifest,
    /// Blob storage location of the bag.
    pub location: BagLocation,
    /// Version of this bag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<BagVersion>,
    /// Space the bag lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<BagSpace>,
    /// Descriptive metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<BagInfo>,
    /// Creation timestamp as reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

impl Bag {
    /// Create a bag from its manifests and location.
    ///
    /// # Arguments
    /// * `manifest` - Payload manifest
    /// * `tag_manifest` - Tag manifest
    /// * `location` - Blob storage location
    pub fn new(manifest: BagManifest, tag_manifest: BagManifest, location: BagLocation) -> Self {
        Self {
            manifest,
            tag_manifest,
            location,
            version: None,
            space: None,
            info: None,
            created_date: None,
        }
    }

    /// Decode a bag from the storage service JSON representation.
    pub fn decode(json: &str) -> Result<Self, ModelError> {
        crate::decode::decode_bag(json)
    }

    /// Iterate over manifest entries followed by tag manifest entries.
    pub fn entries(&self) -> impl Iterator<Item = &BagFile> {
        self.manifest.files.iter().chain(self.tag_manifest.files.iter())
    }

    /// Get the total number of entries across both manifests.
    pub fn file_count(&self) -> usize {
        self.manifest.files.len() + self.tag_manifest.files.len()
    }

    /// Get the external identifier recorded in the bag info, if any.
    pub fn external_identifier(&self) -> Option<&str> {
        self.info
            .as_ref()
            .and_then(|info| info.external_identifier.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_joins_with_single_slash() {
        let location: BagLocation = BagLocation::new("bucket", "digitised/b1234");
        assert_eq!(location.object_key("v1/data/a.txt"), "digitised/b1234/v1/data/a.txt");

        let trailing: BagLocation = BagLocation::new("bucket", "digitised/b1234/");
        assert_eq!(trailing.object_key("v1/data/a.txt"), "digitised/b1234/v1/data/a.txt");
        assert_eq!(trailing.object_key("/v1/data/a.txt"), "digitised/b1234/v1/data/a.txt");
    }

    #[test]
    fn test_object_key_empty_base() {
        let location: BagLocation = BagLocation::new("bucket", "");
        assert_eq!(location.object_key("v1/bagit.txt"), "v1/bagit.txt");
    }

    #[test]
    fn test_entries_chain_manifest_then_tag_manifest() {
        let bag: Bag = Bag::new(
            BagManifest::new(vec![BagFile::new("data/a.txt", "v1/data/a.txt")]),
            BagManifest::new(vec![BagFile::new("bagit.txt", "v1/bagit.txt")]),
            BagLocation::new("bucket", "space/id"),
        );

        let names: Vec<&str> = bag.entries().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["data/a.txt", "bagit.txt"]);
        assert_eq!(bag.file_count(), 2);
    }
}
