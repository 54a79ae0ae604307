//! Metadata index backed by the storage service's Elasticsearch bag index.
//!
//! `ElasticMetadataIndex` shapes the queries and decodes the responses. The
//! HTTP exchange itself is delegated to a `SearchTransport`, so the client
//! library and credentials stay outside this crate.

use async_trait::async_trait;
use rusty_bags_model::BagVersion;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::StorageError;
use crate::traits::MetadataIndex;

/// Default cap on the number of identifiers or spaces returned by one query.
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

const BACKEND: &str = "search index";

/// Raw request interface to the search cluster.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Run a search request.
    ///
    /// # Arguments
    /// * `index` - Index name
    /// * `body` - Query body
    ///
    /// # Returns
    /// The decoded response body.
    async fn search(&self, index: &str, body: Value) -> Result<Value, StorageError>;

    /// Fetch one document by id.
    ///
    /// # Arguments
    /// * `index` - Index name
    /// * `id` - Document id
    /// * `source` - `_source` filter
    ///
    /// # Returns
    /// The response body, or `None` when the document does not exist.
    async fn get_document(
        &self,
        index: &str,
        id: &str,
        source: &str,
    ) -> Result<Option<Value>, StorageError>;
}

/// Index settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Name of the bag index.
    pub index_name: String,
    /// Maximum results per query.
    pub max_results: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            index_name: "storage_stage_bags".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl IndexSettings {
    /// Set the index name.
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Set the result cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SpacesResponse {
    aggregations: SpacesAggregations,
}

#[derive(Debug, Deserialize)]
struct SpacesAggregations {
    spaces: TermsAggregation,
}

#[derive(Debug, Deserialize)]
struct TermsAggregation {
    buckets: Vec<TermsBucket>,
}

#[derive(Debug, Deserialize)]
struct TermsBucket {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<IdentifierHit>,
}

#[derive(Debug, Deserialize)]
struct IdentifierHit {
    #[serde(rename = "_source")]
    source: IdentifierSource,
}

#[derive(Debug, Deserialize)]
struct IdentifierSource {
    info: IdentifierInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentifierInfo {
    external_identifier: String,
}

#[derive(Debug, Deserialize)]
struct VersionDocument {
    #[serde(rename = "_source")]
    source: VersionSource,
}

#[derive(Debug, Deserialize)]
struct VersionSource {
    version: IndexedVersion,
}

/// The index stores versions as integers; older documents carry `"vN"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexedVersion {
    Number(u32),
    Label(String),
}

impl IndexedVersion {
    fn into_version(self) -> Result<BagVersion, StorageError> {
        match self {
            IndexedVersion::Number(n) => BagVersion::new(n)
                .ok_or_else(|| StorageError::malformed(BACKEND, format!("invalid version {}", n))),
            IndexedVersion::Label(label) => BagVersion::parse(&label)
                .map_err(|e| StorageError::malformed(BACKEND, e.to_string())),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::malformed(BACKEND, e.to_string()))
}

/// `MetadataIndex` over the bag search index.
pub struct ElasticMetadataIndex<T: SearchTransport> {
    transport: T,
    settings: IndexSettings,
}

impl<T: SearchTransport> ElasticMetadataIndex<T> {
    /// Create an index client.
    ///
    /// # Arguments
    /// * `transport` - Request transport
    /// * `settings` - Index name and result cap
    pub fn new(transport: T, settings: IndexSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn spaces_query(&self) -> Value {
        json!({
            "size": 0,
            "aggs": {
                "spaces": {
                    "terms": {"field": "space", "size": self.settings.max_results}
                }
            }
        })
    }

    fn identifiers_query(&self, space: &str) -> Value {
        json!({
            "query": {
                "bool": {
                    "must": [
                        {"term": {"space": {"value": space}}}
                    ]
                }
            },
            "_source": "info.externalIdentifier",
            "size": self.settings.max_results
        })
    }

    fn warn_if_capped(&self, what: &str, count: usize) {
        if count >= self.settings.max_results {
            tracing::warn!(
                index = %self.settings.index_name,
                max_results = self.settings.max_results,
                "{} listing reached the result cap and may be incomplete",
                what
            );
        }
    }
}

#[async_trait]
impl<T: SearchTransport> MetadataIndex for ElasticMetadataIndex<T> {
    async fn list_spaces(&self) -> Result<Vec<String>, StorageError> {
        let response: Value = self
            .transport
            .search(&self.settings.index_name, self.spaces_query())
            .await?;
        let decoded: SpacesResponse = decode(response)?;

        let spaces: Vec<String> = decoded
            .aggregations
            .spaces
            .buckets
            .into_iter()
            .map(|bucket| bucket.key)
            .collect();
        self.warn_if_capped("space", spaces.len());
        Ok(spaces)
    }

    async fn list_external_identifiers(&self, space: &str) -> Result<Vec<String>, StorageError> {
        let response: Value = self
            .transport
            .search(&self.settings.index_name, self.identifiers_query(space))
            .await?;
        let decoded: SearchResponse = decode(response)?;

        let identifiers: Vec<String> = decoded
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.info.external_identifier)
            .collect();
        tracing::debug!(space, count = identifiers.len(), "listed external identifiers");
        self.warn_if_capped("identifier", identifiers.len());
        Ok(identifiers)
    }

    async fn latest_version(
        &self,
        space: &str,
        external_identifier: &str,
    ) -> Result<Option<BagVersion>, StorageError> {
        let id: String = format!("{}/{}", space, external_identifier);
        let document: Option<Value> = self
            .transport
            .get_document(&self.settings.index_name, &id, "version")
            .await?;

        match document {
            Some(value) => {
                let decoded: VersionDocument = decode(value)?;
                Ok(Some(decoded.source.version.into_version()?))
            }
            None => Ok(None),
        }
    }
}
