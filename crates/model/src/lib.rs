//! Bag model for the archival storage service.
//!
//! A bag is an immutable, versioned package of files identified by
//! `(space, external identifier, version)`. This crate provides:
//!
//! - `bag` - The bag document returned by the storage service (manifest,
//!   tag manifest, blob storage location)
//! - `version` - Bag versions (`v1`, `v2`, ...)
//! - `identifier` - The reversible escaping codec that lets an external
//!   identifier containing `/` appear as a single path segment

pub mod bag;
pub mod error;
pub mod identifier;
pub mod version;

mod decode;

pub use bag::{Bag, BagFile, BagInfo, BagLocation, BagManifest, BagSpace};
pub use decode::decode_bag;
pub use error::ModelError;
pub use identifier::{escape_identifier, unescape_identifier, ESCAPED_SEPARATOR};
pub use version::BagVersion;
