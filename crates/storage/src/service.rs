//! Bag source backed by the storage service's bags API.

use std::sync::Arc;

use async_trait::async_trait;
use rusty_bags_model::{decode_bag, Bag, BagVersion};

use crate::error::StorageError;
use crate::traits::BagSource;

const BACKEND: &str = "storage service";

/// Raw request interface to the bags API.
///
/// Implementations own authentication and retries.
#[async_trait]
pub trait BagApiTransport: Send + Sync {
    /// Fetch the JSON document of one bag version.
    ///
    /// # Arguments
    /// * `space` - Space name
    /// * `external_identifier` - Unescaped external identifier
    /// * `version` - Bag version, sent as `vN`
    ///
    /// # Returns
    /// The response body, or `None` when the service has no such bag.
    async fn fetch_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Option<String>, StorageError>;
}

/// `BagSource` that decodes bag documents returned by the bags API.
pub struct StorageServiceBagSource<T: BagApiTransport> {
    transport: T,
}

impl<T: BagApiTransport> StorageServiceBagSource<T> {
    /// Create a bag source.
    ///
    /// # Arguments
    /// * `transport` - Request transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: BagApiTransport> BagSource for StorageServiceBagSource<T> {
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError> {
        let body: String = self
            .transport
            .fetch_bag(space, external_identifier, version)
            .await?
            .ok_or_else(|| {
                StorageError::not_found(format!("bag {}/{}/{}", space, external_identifier, version))
            })?;

        let bag: Bag = decode_bag(&body).map_err(|e| {
            tracing::error!(
                space,
                external_identifier,
                version = %version,
                error = %e,
                "failed to decode bag"
            );
            StorageError::malformed(BACKEND, e.to_string())
        })?;

        Ok(Arc::new(bag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedTransport {
        body: Option<String>,
        calls: AtomicU64,
    }

    impl FixedTransport {
        fn new(body: Option<&str>) -> Self {
            Self {
                body: body.map(str::to_string),
                calls: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl BagApiTransport for FixedTransport {
        async fn fetch_bag(
            &self,
            _space: &str,
            _external_identifier: &str,
            _version: BagVersion,
        ) -> Result<Option<String>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    #[tokio::test]
    async fn test_decodes_bag_document() {
        let source = StorageServiceBagSource::new(FixedTransport::new(Some(
            r#"{
                "manifest": {"files": [{"name": "data/a.txt", "path": "v1/data/a.txt", "size": 3}]},
                "tagManifest": {"files": [{"name": "bagit.txt", "path": "v1/bagit.txt"}]},
                "location": {"bucket": "bucket", "path": "s/id"},
                "version": "v1"
            }"#,
        )));

        let bag: Arc<Bag> = source.get_bag("s", "id", BagVersion::FIRST).await.unwrap();
        assert_eq!(bag.file_count(), 2);
        assert_eq!(bag.location.object_key("v1/data/a.txt"), "s/id/v1/data/a.txt");
        assert_eq!(source.transport().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_bag_is_not_found() {
        let source = StorageServiceBagSource::new(FixedTransport::new(None));
        let err: StorageError = source.get_bag("s", "id", BagVersion::FIRST).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_undecodable_bag_is_malformed() {
        let source = StorageServiceBagSource::new(FixedTransport::new(Some(r#"{"manifest": {}}"#)));
        let result = source.get_bag("s", "id", BagVersion::FIRST).await;
        assert!(matches!(
            result,
            Err(StorageError::MalformedResponse { backend: "storage service", .. })
        ));
    }
}
