//! Error types for backend operations.

use thiserror::Error;

/// Errors reported by the search index, the storage service or blob storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object, document or bag does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// The backend refused the request.
    #[error("Access denied: {resource}")]
    AccessDenied {
        /// Description of the refused resource.
        resource: String,
    },

    /// Network or protocol failure talking to the backend.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The backend answered with something that could not be decoded.
    #[error("Malformed response from {backend}: {message}")]
    MalformedResponse {
        /// Backend that produced the response.
        backend: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl StorageError {
    /// Create a NotFound error.
    ///
    /// # Arguments
    /// * `resource` - Description of the missing resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a MalformedResponse error.
    ///
    /// # Arguments
    /// * `backend` - Backend that produced the response
    /// * `message` - What was wrong with it
    pub fn malformed(backend: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            backend,
            message: message.into(),
        }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
