//! Error types for the VFS crate.

use std::fmt;

use rusty_bags_storage::StorageError;

use crate::executor::ExecutorError;

/// Errors that can occur during VFS operations.
#[derive(Debug)]
pub enum VfsError {
    /// Path segment, identifier, version or child name does not resolve.
    NotFound { path: String },

    /// A file and a directory share a name at the same level of a bag.
    AmbiguousEntry { prefix: String, name: String },

    /// A backend call failed.
    Backend {
        context: String,
        source: StorageError,
    },

    /// A manifest entry name cannot be placed in a directory tree.
    MalformedManifest { name: String, reason: &'static str },

    /// Listing requested on a file.
    NotACollection(String),

    /// Content requested on a collection.
    NotAFile(String),

    /// Background executor failure.
    Executor(ExecutorError),

    /// IO error.
    Io(std::io::Error),

    /// Read-only filesystem.
    ReadOnly,
}

impl VfsError {
    /// Create a NotFound error.
    ///
    /// # Arguments
    /// * `path` - Path or coordinates that did not resolve
    pub fn not_found(path: impl Into<String>) -> Self {
        VfsError::NotFound { path: path.into() }
    }

    /// Wrap a backend failure, keeping the source.
    ///
    /// # Arguments
    /// * `context` - What was being fetched
    /// * `source` - Backend error
    pub fn backend(context: impl Into<String>, source: StorageError) -> Self {
        VfsError::Backend {
            context: context.into(),
            source,
        }
    }

    /// Wrap a failed bag fetch.
    ///
    /// Versions are listed densely up to the latest, so a bag source NotFound
    /// for a listed version is a miss. Any other failure stays a backend error.
    ///
    /// # Arguments
    /// * `coordinates` - `space/id/vN` of the bag
    /// * `source` - Bag source error
    pub fn bag_fetch(coordinates: impl Into<String>, source: StorageError) -> Self {
        let context: String = format!("bag {}", coordinates.into());
        if source.is_not_found() {
            VfsError::NotFound { path: context }
        } else {
            VfsError::Backend { context, source }
        }
    }

    /// Check if this error is an ordinary browsing miss (NotFound or
    /// AmbiguousEntry) rather than a failure.
    pub fn is_miss(&self) -> bool {
        matches!(self, VfsError::NotFound { .. } | VfsError::AmbiguousEntry { .. })
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound { path } => write!(f, "Not found: {}", path),
            VfsError::AmbiguousEntry { prefix, name } => {
                write!(f, "Ambiguous entry {:?} under {:?}: both file and directory", name, prefix)
            }
            VfsError::Backend { context, source } => {
                write!(f, "Backend failure for {}: {}", context, source)
            }
            VfsError::MalformedManifest { name, reason } => {
                write!(f, "Malformed manifest entry {:?}: {}", name, reason)
            }
            VfsError::NotACollection(path) => write!(f, "Not a collection: {}", path),
            VfsError::NotAFile(path) => write!(f, "Not a file: {}", path),
            VfsError::Executor(e) => write!(f, "Executor error: {}", e),
            VfsError::Io(e) => write!(f, "IO error: {}", e),
            VfsError::ReadOnly => write!(f, "Read-only filesystem"),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::Backend { source, .. } => Some(source),
            VfsError::Executor(e) => Some(e),
            VfsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExecutorError> for VfsError {
    fn from(e: ExecutorError) -> Self {
        VfsError::Executor(e)
    }
}

impl From<std::io::Error> for VfsError {
    fn from(e: std::io::Error) -> Self {
        VfsError::Io(e)
    }
}

impl From<VfsError> for std::io::Error {
    fn from(e: VfsError) -> Self {
        let kind: std::io::ErrorKind = match &e {
            VfsError::NotFound { .. } => std::io::ErrorKind::NotFound,
            VfsError::Backend {
                source: StorageError::AccessDenied { .. },
                ..
            } => std::io::ErrorKind::PermissionDenied,
            VfsError::Io(inner) => inner.kind(),
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}
