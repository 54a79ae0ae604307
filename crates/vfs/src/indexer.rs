//! Directory reconstruction from flat bag manifests.
//!
//! A bag manifest is a flat list of `name -> path` entries where `name` is a
//! forward-slash logical path (`data/objects/cat.jpg`). The browser never
//! builds the whole tree. Each directory node asks for the direct children
//! under its own prefix and throws the result away afterwards.
//!
//! For a prefix `p` (empty, or ending in `/`), an entry `name`:
//! - outside `p` belongs to a sibling branch and is skipped
//! - with no further `/` after `p` is a file child, keyed by its basename
//! - otherwise contributes the segment right after `p` as a directory child

use std::collections::{BTreeMap, BTreeSet};

use rusty_bags_model::BagFile;

use crate::error::VfsError;

/// Direct children of one directory level in a bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryIndex {
    /// Basename -> storage path, for direct file children.
    files: BTreeMap<String, String>,
    /// Names of direct subdirectories.
    directories: BTreeSet<String>,
}

/// Outcome of looking a name up in a `DirectoryIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The name is a subdirectory.
    Directory,
    /// The name is a file stored at the given storage path.
    File(&'a str),
    /// The name is both a subdirectory and a file stored at the given path.
    Both(&'a str),
    /// The name is not a child of this level.
    Missing,
}

impl DirectoryIndex {
    /// Build the index of direct children under `prefix`.
    ///
    /// When two entries map to the same file name, the first one wins; bag
    /// entries are iterated manifest first, then tag manifest.
    ///
    /// # Arguments
    /// * `entries` - Manifest and tag manifest entries
    /// * `prefix` - Directory prefix, empty or ending in `/`
    ///
    /// # Returns
    /// The index, or `MalformedManifest` for an entry name that cannot sit in
    /// a directory tree.
    pub fn build<'a, I>(entries: I, prefix: &str) -> Result<Self, VfsError>
    where
        I: IntoIterator<Item = &'a BagFile>,
    {
        debug_assert!(prefix.is_empty() || prefix.ends_with('/'));

        let mut index: DirectoryIndex = DirectoryIndex::default();

        for entry in entries {
            validate_name(&entry.name)?;

            let Some(rest) = entry.name.strip_prefix(prefix) else {
                continue;
            };

            match rest.split_once('/') {
                None => {
                    if index.files.contains_key(rest) {
                        tracing::trace!("duplicate entry ignored: {}", entry.name);
                        continue;
                    }
                    index.files.insert(rest.to_string(), entry.path.clone());
                }
                Some((directory, _)) => {
                    index.directories.insert(directory.to_string());
                }
            }
        }

        Ok(index)
    }

    /// Look up a direct child by name.
    ///
    /// # Arguments
    /// * `name` - Child name
    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        let file: Option<&str> = self.files.get(name).map(String::as_str);
        match (self.directories.contains(name), file) {
            (true, Some(path)) => Lookup::Both(path),
            (true, None) => Lookup::Directory,
            (false, Some(path)) => Lookup::File(path),
            (false, None) => Lookup::Missing,
        }
    }

    /// Every child name, sorted, each listed once.
    pub fn names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.directories.iter().chain(self.files.keys()).collect();
        names.into_iter().cloned().collect()
    }

    /// Iterate over file children as `(name, storage path)`.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(name, path)| (name.as_str(), path.as_str()))
    }

    /// Iterate over subdirectory names.
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.directories.iter().map(String::as_str)
    }

    /// Names that are both a file and a directory.
    pub fn collisions(&self) -> impl Iterator<Item = &str> {
        self.files
            .keys()
            .filter(|name| self.directories.contains(*name))
            .map(String::as_str)
    }

    /// Check if the level has no children.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), VfsError> {
    let reason: Option<&'static str> = if name.is_empty() {
        Some("empty name")
    } else if name.starts_with('/') {
        Some("absolute name")
    } else if name.ends_with('/') {
        Some("trailing separator")
    } else if name.contains("//") {
        Some("empty path segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(VfsError::MalformedManifest {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
