//! Error types for the bag model.

use thiserror::Error;

/// Errors that can occur while decoding or naming bags.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid bag version: {0:?}")]
    InvalidVersion(String),

    #[error("Bag document is missing '{0}'")]
    MissingField(&'static str),

    #[error("External identifier {0:?} already contains the escaped separator and cannot be exposed as a path segment")]
    UnrepresentableIdentifier(String),
}
