//! Read-only virtual filesystem over archival storage bags.
//!
//! Clients browse a synthetic tree that exists on no disk:
//!
//! ```text
//! /{space}/{externalIdentifier}/v{version}/{path within the bag...}
//! ```
//!
//! Every listing and read is computed on demand from the search index, the
//! storage service's bag manifests and blob storage.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: Provider (BagProvider, ResourceNode, ContentReader) - sync, for protocol servers
//! Layer 2: Resolution (Resolver, PathNode tree)                - async
//! Layer 1: Primitives (DirectoryIndex, identifier codec, AsyncExecutor)
//! ```
//!
//! External identifiers may contain `/`, which is shown as U+29F8 inside a
//! single path segment. Bags are fetched through a `BagSource`; wrap it with
//! `Backends::with_bag_cache` to memoize them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rusty_bags_storage::BagCache;
//! use rusty_bags_vfs::{Backends, BagProvider, VfsOptions};
//!
//! let backends = Backends::new(index, bags, objects).with_bag_cache(Arc::new(BagCache::default()));
//! let provider = BagProvider::new(backends, VfsOptions::default())?;
//! if let Some(node) = provider.get_resource_node("/digitised/b1234/v1/data")? {
//!     for name in node.list_child_names()? {
//!         println!("{}", name);
//!     }
//! }
//! ```

pub mod backends;
pub mod content;
pub mod error;
pub mod executor;
pub mod indexer;
pub mod node;
pub mod options;
pub mod provider;
pub mod resolver;

pub use backends::Backends;
pub use content::ContentReader;
pub use error::VfsError;
pub use executor::{AsyncExecutor, ExecutorConfig, ExecutorError};
pub use indexer::{DirectoryIndex, Lookup};
pub use node::{
    BagChild, BagFileNode, BagPathNode, DisplayInfo, IdentifierNode, NodeKind, PathNode, SpaceNode,
};
pub use options::{CollisionPolicy, VfsOptions, DEFAULT_READ_CHUNK_SIZE};
pub use provider::{BagProvider, ResourceNode};
pub use resolver::Resolver;
