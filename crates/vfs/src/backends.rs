//! The collaborators a bag browser talks to.

use std::sync::Arc;

use rusty_bags_storage::{BagCache, BagSource, CachingBagSource, MetadataIndex, ObjectStore};

/// Search index, bag API and blob storage handles, injected at construction.
#[derive(Clone)]
pub struct Backends {
    /// Search index of bags.
    pub index: Arc<dyn MetadataIndex>,
    /// Bag manifest source.
    pub bags: Arc<dyn BagSource>,
    /// Blob storage holding bag files.
    pub objects: Arc<dyn ObjectStore>,
}

impl Backends {
    /// Bundle the three collaborators.
    ///
    /// # Arguments
    /// * `index` - Search index
    /// * `bags` - Bag source
    /// * `objects` - Blob storage
    pub fn new(
        index: Arc<dyn MetadataIndex>,
        bags: Arc<dyn BagSource>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            index,
            bags,
            objects,
        }
    }

    /// Memoize bag fetches in `cache`.
    ///
    /// # Arguments
    /// * `cache` - Cache shared by every node resolved through these backends
    pub fn with_bag_cache(mut self, cache: Arc<BagCache>) -> Self {
        let cached: CachingBagSource<Arc<dyn BagSource>> = CachingBagSource::new(self.bags, cache);
        self.bags = Arc::new(cached);
        self
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
