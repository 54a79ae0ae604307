//! Storage abstractions for the bag browser.
//!
//! The browser never talks to a backend directly. It consumes three
//! collaborator interfaces, each of which can be backed by a real service or
//! by the in-memory implementations in `memory`:
//!
//! - **MetadataIndex** - The search index of bags (spaces, external
//!   identifiers, latest versions)
//! - **BagSource** - The storage service API returning bag manifests
//! - **ObjectStore** - Blob storage holding the bag payload files
//!
//! # Caching
//!
//! Bags are immutable once published. `CachingBagSource` memoizes them in an
//! explicit `BagCache` passed in at construction time, so tests and callers
//! control its size and lifetime.
//!
//! # Adapters
//!
//! `ElasticMetadataIndex` shapes the search queries and decodes the responses;
//! `StorageServiceBagSource` decodes bag documents. Both delegate the actual
//! HTTP exchange to an injected transport.

pub mod cache;
mod error;
pub mod memory;
pub mod search;
pub mod service;
mod traits;

pub use cache::{BagCache, BagKey, CacheSettings, CachingBagSource, DEFAULT_BAG_CACHE_CAPACITY};
pub use error::StorageError;
pub use memory::{MemoryBagSource, MemoryMetadataIndex, MemoryObjectStore};
pub use search::{ElasticMetadataIndex, IndexSettings, SearchTransport, DEFAULT_MAX_RESULTS};
pub use service::{BagApiTransport, StorageServiceBagSource};
pub use traits::{BagSource, ByteRange, ByteStream, MetadataIndex, ObjectMetadata, ObjectStore};
