//! Integration tests for the bag provider.
//!
//! Tests drive the synchronous provider the way a protocol server would,
//! against in-memory backends with call counting.

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusty_bags_model::{Bag, BagFile, BagLocation, BagManifest, BagVersion};
use rusty_bags_storage::{
    BagCache, BagSource, MemoryBagSource, MemoryMetadataIndex, MemoryObjectStore, MetadataIndex,
    StorageError,
};
use rusty_bags_vfs::{
    Backends, BagProvider, CollisionPolicy, ExecutorConfig, NodeKind, ResourceNode, VfsError,
    VfsOptions,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

const FOO_BAR: &str = "foo\u{29F8}bar";

/// How `CountingIndex` answers once switched to fail.
type FailureFn = fn() -> StorageError;

/// Search index that counts calls and can be switched to fail.
struct CountingIndex {
    inner: MemoryMetadataIndex,
    calls: AtomicU64,
    failure: Mutex<Option<FailureFn>>,
}

impl CountingIndex {
    fn new(inner: MemoryMetadataIndex) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Get the number of index calls made.
    fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with the given error.
    fn fail_with(&self, failure: FailureFn) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    fn record(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

fn unreachable_cluster() -> StorageError {
    StorageError::Transport {
        message: "search cluster unreachable".to_string(),
    }
}

fn missing_index() -> StorageError {
    StorageError::not_found("index storage_stage_bags")
}

#[async_trait]
impl MetadataIndex for CountingIndex {
    async fn list_spaces(&self) -> Result<Vec<String>, StorageError> {
        self.record()?;
        self.inner.list_spaces().await
    }

    async fn list_external_identifiers(&self, space: &str) -> Result<Vec<String>, StorageError> {
        self.record()?;
        self.inner.list_external_identifiers(space).await
    }

    async fn latest_version(
        &self,
        space: &str,
        external_identifier: &str,
    ) -> Result<Option<BagVersion>, StorageError> {
        self.record()?;
        self.inner.latest_version(space, external_identifier).await
    }
}

/// Bag source that answers after a delay, to widen race windows.
struct SlowBagSource {
    inner: Arc<MemoryBagSource>,
    delay: Duration,
}

#[async_trait]
impl BagSource for SlowBagSource {
    async fn get_bag(
        &self,
        space: &str,
        external_identifier: &str,
        version: BagVersion,
    ) -> Result<Arc<Bag>, StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_bag(space, external_identifier, version).await
    }
}

/// Test environment: provider plus handles on every backend.
struct TestEnv {
    provider: Arc<BagProvider>,
    index: Arc<CountingIndex>,
    bags: Arc<MemoryBagSource>,
    objects: Arc<MemoryObjectStore>,
    cache: Arc<BagCache>,
}

fn v(n: u32) -> BagVersion {
    BagVersion::new(n).unwrap()
}

fn entries(names: &[&str], version: &str) -> Vec<BagFile> {
    names
        .iter()
        .map(|name| BagFile::new(*name, format!("{}/{}", version, name)))
        .collect()
}

fn sample_bag() -> Bag {
    let mut files: Vec<BagFile> = entries(
        &[
            "data/objects/cat.jpg",
            "data/objects/images/dog.jpg",
            "data/logs/run.log",
        ],
        "v1",
    );
    files.push(BagFile::new("data/objects/.DS_Store", "v2/data/objects/.DS_Store"));
    files.push(BagFile::new("data/notes", "v2/data/notes"));
    files.push(BagFile::new("data/notes/readme.txt", "v2/data/notes/readme.txt"));

    Bag::new(
        BagManifest::new(files),
        BagManifest::new(entries(&["bagit.txt", "manifest-sha256.txt"], "v2")),
        BagLocation::new("storage", "s1/foo/bar"),
    )
}

/// Create a provider over a small archive.
///
/// - `s1/foo/bar` has versions 1 and 2; only v2 exists in the bag API
/// - `s1/b1234` has twelve versions
/// - `digitised/x` has one version
fn create_test_env(options: VfsOptions, bag_delay: Option<Duration>) -> TestEnv {
    let index: MemoryMetadataIndex = MemoryMetadataIndex::new();
    index.insert("s1", "foo/bar", v(2));
    index.insert("s1", "b1234", v(12));
    index.insert("digitised", "x", v(1));
    let index: Arc<CountingIndex> = Arc::new(CountingIndex::new(index));

    let bags: Arc<MemoryBagSource> = Arc::new(MemoryBagSource::new());
    bags.insert("s1", "foo/bar", v(2), sample_bag());

    let objects: Arc<MemoryObjectStore> = Arc::new(MemoryObjectStore::new().with_chunk_size(4));
    objects.insert("storage", "s1/foo/bar/v1/data/objects/cat.jpg", &b"meow meow"[..]);
    objects.insert("storage", "s1/foo/bar/v2/bagit.txt", &b"BagIt-Version: 0.97\n"[..]);

    let source: Arc<dyn BagSource> = match bag_delay {
        Some(delay) => Arc::new(SlowBagSource {
            inner: bags.clone(),
            delay,
        }),
        None => bags.clone(),
    };

    let cache: Arc<BagCache> = Arc::new(BagCache::default());
    let backends: Backends =
        Backends::new(index.clone(), source, objects.clone()).with_bag_cache(cache.clone());
    let provider: BagProvider = BagProvider::new(backends, options).unwrap();

    TestEnv {
        provider: Arc::new(provider),
        index,
        bags,
        objects,
        cache,
    }
}

fn default_env() -> TestEnv {
    create_test_env(VfsOptions::default(), None)
}

fn node(env: &TestEnv, path: &str) -> ResourceNode {
    env.provider
        .get_resource_node(path)
        .unwrap()
        .unwrap_or_else(|| panic!("{} should resolve", path))
}

fn names(env: &TestEnv, path: &str) -> Vec<String> {
    node(env, path).list_child_names().unwrap()
}

// ============================================================================
// Catalog Levels
// ============================================================================

#[test]
fn test_root_lists_sorted_spaces() {
    let env: TestEnv = default_env();
    let root: ResourceNode = node(&env, "/");

    assert!(root.is_collection());
    assert_eq!(root.kind(), NodeKind::Root);
    assert_eq!(root.name(), "");
    assert_eq!(root.list_child_names().unwrap(), vec!["digitised", "s1"]);
}

#[test]
fn test_identifier_with_separator_is_escaped() {
    let env: TestEnv = default_env();

    let listed: Vec<String> = names(&env, "/s1");
    assert_eq!(listed, vec!["b1234".to_string(), FOO_BAR.to_string()]);

    let identifier: ResourceNode = node(&env, &format!("/s1/{}", FOO_BAR));
    assert_eq!(identifier.kind(), NodeKind::ExternalIdentifier);
    assert_eq!(
        identifier.display_info().external_identifier.as_deref(),
        Some("foo/bar")
    );
    assert_eq!(identifier.name(), FOO_BAR);
}

#[test]
fn test_unescaped_identifier_path_is_not_found() {
    let env: TestEnv = default_env();
    assert!(env.provider.get_resource_node("/s1/foo/bar").unwrap().is_none());
}

#[test]
fn test_versions_listed_in_numeric_order() {
    let env: TestEnv = default_env();

    let expected: Vec<String> = (1..=12).map(|n| format!("v{}", n)).collect();
    assert_eq!(names(&env, "/s1/b1234"), expected);
    assert_eq!(names(&env, &format!("/s1/{}", FOO_BAR)), vec!["v1", "v2"]);
}

#[test]
fn test_version_beyond_latest_is_not_found() {
    let env: TestEnv = default_env();
    assert!(env
        .provider
        .get_resource_node(&format!("/s1/{}/v3", FOO_BAR))
        .unwrap()
        .is_none());
}

#[test]
fn test_version_gap_lists_as_not_found() {
    let env: TestEnv = default_env();

    // v1 is listed (versions are assumed dense) but the bag API has no v1.
    let gap: ResourceNode = node(&env, &format!("/s1/{}/v1", FOO_BAR));
    let result: Result<Vec<String>, VfsError> = gap.list_child_names();
    assert!(matches!(result, Err(VfsError::NotFound { .. })));
}

// ============================================================================
// Bag Levels
// ============================================================================

#[test]
fn test_bag_directory_levels() {
    let env: TestEnv = default_env();
    let version: String = format!("/s1/{}/v2", FOO_BAR);

    assert_eq!(
        names(&env, &version),
        vec!["bagit.txt", "data", "manifest-sha256.txt"]
    );
    assert_eq!(
        names(&env, &format!("{}/data", version)),
        vec!["logs", "notes", "objects"]
    );
    // The hidden file exists in the manifest but is not listed.
    assert_eq!(
        names(&env, &format!("{}/data/objects", version)),
        vec!["cat.jpg", "images"]
    );
}

#[test]
fn test_display_info_of_bag_nodes() {
    let env: TestEnv = default_env();

    let version: ResourceNode = node(&env, &format!("/s1/{}/v2", FOO_BAR));
    assert_eq!(version.kind(), NodeKind::Version);

    let directory: ResourceNode = node(&env, &format!("/s1/{}/v2/data/objects", FOO_BAR));
    let info = directory.display_info();
    assert_eq!(info.kind, NodeKind::Directory);
    assert_eq!(info.space.as_deref(), Some("s1"));
    assert_eq!(info.version.as_deref(), Some("v2"));
    assert_eq!(info.bag_path.as_deref(), Some("data/objects/"));
}

#[test]
fn test_navigation_by_child() {
    let env: TestEnv = default_env();
    let root: ResourceNode = node(&env, "/");

    let file: ResourceNode = root
        .get_child("s1")
        .unwrap()
        .and_then(|n| n.get_child(FOO_BAR).unwrap())
        .and_then(|n| n.get_child("v2").unwrap())
        .and_then(|n| n.get_child("data").unwrap())
        .and_then(|n| n.get_child("objects").unwrap())
        .and_then(|n| n.get_child("cat.jpg").unwrap())
        .unwrap();

    assert_eq!(file.path(), format!("/s1/{}/v2/data/objects/cat.jpg", FOO_BAR));
    assert_eq!(file.name(), "cat.jpg");
    assert!(!file.is_collection());

    assert!(root.get_child("nope").unwrap().is_none());
    assert!(root.get_child("s1/foo").unwrap().is_none());
}

#[test]
fn test_collision_resolves_to_directory() {
    let env: TestEnv = default_env();
    let notes: ResourceNode = node(&env, &format!("/s1/{}/v2/data/notes", FOO_BAR));

    assert_eq!(notes.kind(), NodeKind::Directory);
    assert_eq!(notes.list_child_names().unwrap(), vec!["readme.txt"]);
}

#[test]
fn test_collision_rejected_when_configured() {
    let options: VfsOptions = VfsOptions::default().with_collision_policy(CollisionPolicy::Reject);
    let env: TestEnv = create_test_env(options, None);

    let result = env
        .provider
        .get_resource_node(&format!("/s1/{}/v2/data/notes", FOO_BAR))
        .unwrap();
    assert!(result.is_none());
}

// ============================================================================
// Hidden Files
// ============================================================================

#[test]
fn test_hidden_probe_makes_no_backend_calls() {
    let env: TestEnv = default_env();

    for path in [
        "/.DS_Store".to_string(),
        format!("/s1/{}/v2/data/objects/.DS_Store", FOO_BAR),
        format!("/s1/{}/v2/._cat.jpg", FOO_BAR),
        "/.hidden/s1".to_string(),
    ] {
        let result: Option<ResourceNode> = env.provider.get_resource_node(&path).unwrap();
        assert!(result.is_none(), "{} should not resolve", path);
    }

    assert_eq!(env.index.call_count(), 0);
    assert_eq!(env.bags.fetch_count(), 0);
}

#[test]
fn test_dot_files_shown_when_configured() {
    let env: TestEnv = create_test_env(VfsOptions::default().with_hide_dot_files(false), None);
    let objects: String = format!("/s1/{}/v2/data/objects", FOO_BAR);

    assert_eq!(names(&env, &objects), vec![".DS_Store", "cat.jpg", "images"]);
    assert!(env
        .provider
        .get_resource_node(&format!("{}/.DS_Store", objects))
        .unwrap()
        .is_some());
}

// ============================================================================
// File Content
// ============================================================================

#[test]
fn test_file_content_and_metadata() {
    let env: TestEnv = default_env();
    let cat: ResourceNode = node(&env, &format!("/s1/{}/v2/data/objects/cat.jpg", FOO_BAR));

    assert_eq!(cat.kind(), NodeKind::File);
    assert_eq!(cat.content_length().unwrap(), 9);
    assert_eq!(cat.content_type().unwrap(), "image/jpeg");
    assert_eq!(env.objects.head_count(), 1);
    assert_eq!(env.objects.get_count(), 0);

    let body: Vec<u8> = cat.open_content().unwrap().read_to_vec().unwrap();
    assert_eq!(body, b"meow meow".to_vec());

    let mut part: Vec<u8> = Vec::new();
    cat.open_range(5, 100).unwrap().read_to_end(&mut part).unwrap();
    assert_eq!(part, b"meow".to_vec());
}

#[test]
fn test_tag_file_content() {
    let env: TestEnv = default_env();
    let bagit: ResourceNode = node(&env, &format!("/s1/{}/v2/bagit.txt", FOO_BAR));

    assert_eq!(bagit.content_type().unwrap(), "text/plain");
    let body: Vec<u8> = bagit.open_content().unwrap().read_to_vec().unwrap();
    assert_eq!(body, b"BagIt-Version: 0.97\n".to_vec());
}

#[test]
fn test_missing_blob_is_a_backend_failure() {
    let env: TestEnv = default_env();
    let log: ResourceNode = node(&env, &format!("/s1/{}/v2/data/logs/run.log", FOO_BAR));

    // The manifest lists the file, so an absent blob is a storage fault.
    for result in [log.content_length().map(|_| ()), log.open_content().map(|_| ())] {
        assert!(matches!(
            result,
            Err(VfsError::Backend {
                source: StorageError::NotFound { .. },
                ..
            })
        ));
    }
}

#[test]
fn test_malformed_manifest_is_an_error() {
    let env: TestEnv = default_env();
    env.bags.insert(
        "s1",
        "b1234",
        v(1),
        Bag::new(
            BagManifest::new(entries(&["data/ok.txt", "data//b"], "v1")),
            BagManifest::default(),
            BagLocation::new("storage", "s1/b1234"),
        ),
    );

    let version: ResourceNode = node(&env, "/s1/b1234/v1");
    assert!(matches!(
        version.list_child_names(),
        Err(VfsError::MalformedManifest { ref name, .. }) if name == "data//b"
    ));

    let result = env.provider.get_resource_node("/s1/b1234/v1/data/ok.txt");
    assert!(matches!(result, Err(VfsError::MalformedManifest { .. })));
}

#[test]
fn test_capability_mismatch() {
    let env: TestEnv = default_env();
    let directory: ResourceNode = node(&env, &format!("/s1/{}/v2/data", FOO_BAR));
    let file: ResourceNode = node(&env, &format!("/s1/{}/v2/bagit.txt", FOO_BAR));

    assert!(matches!(directory.content_length(), Err(VfsError::NotAFile(_))));
    assert!(matches!(directory.content_type(), Err(VfsError::NotAFile(_))));
    assert!(matches!(directory.open_content(), Err(VfsError::NotAFile(_))));
    assert!(matches!(file.list_child_names(), Err(VfsError::NotACollection(_))));
    assert!(file.get_child("x").unwrap().is_none());
}

#[test]
fn test_write_operations_are_read_only() {
    let env: TestEnv = default_env();
    let file: ResourceNode = node(&env, &format!("/s1/{}/v2/bagit.txt", FOO_BAR));
    let space: ResourceNode = node(&env, "/s1");

    assert!(matches!(file.delete(), Err(VfsError::ReadOnly)));
    assert!(matches!(file.move_to("/s1/elsewhere"), Err(VfsError::ReadOnly)));
    assert!(matches!(space.copy_to("/s2"), Err(VfsError::ReadOnly)));
}

// ============================================================================
// Caching, Concurrency, Failures
// ============================================================================

#[test]
fn test_bag_fetched_once_across_requests() {
    let env: TestEnv = default_env();
    let version: String = format!("/s1/{}/v2", FOO_BAR);

    names(&env, &version);
    names(&env, &format!("{}/data", version));
    node(&env, &format!("{}/data/objects/cat.jpg", version));

    assert_eq!(env.bags.fetch_count(), 1);
    assert_eq!(env.cache.len(), 1);
    assert!(env.cache.hit_count() >= 3);
}

#[test]
fn test_repeated_resolution_is_idempotent() {
    let env: TestEnv = default_env();
    let path: String = format!("/s1/{}/v2/data", FOO_BAR);

    let first: ResourceNode = node(&env, &path);
    let second: ResourceNode = node(&env, &path);

    assert_eq!(first.node(), second.node());
    assert_eq!(first.list_child_names().unwrap(), second.list_child_names().unwrap());
}

#[test]
fn test_concurrent_resolutions_share_bag() {
    let env: TestEnv = create_test_env(
        VfsOptions::default().with_executor(ExecutorConfig::default().with_worker_threads(2)),
        Some(Duration::from_millis(20)),
    );
    let path: String = format!("/s1/{}/v2/data/objects", FOO_BAR);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider: Arc<BagProvider> = env.provider.clone();
            let path: String = path.clone();
            std::thread::spawn(move || {
                provider
                    .get_resource_node(&path)
                    .unwrap()
                    .unwrap()
                    .list_child_names()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["cat.jpg", "images"]);
    }

    // Racing first fetches may each reach the bag API; the cache keeps one copy.
    assert!(env.bags.fetch_count() >= 1);
    assert_eq!(env.cache.len(), 1);
}

#[test]
fn test_backend_failure_propagates() {
    let env: TestEnv = default_env();
    env.index.fail_with(unreachable_cluster);

    // The root itself needs no backend call.
    let root: ResourceNode = node(&env, "/");
    assert!(matches!(
        root.list_child_names(),
        Err(VfsError::Backend { .. })
    ));

    let result = env.provider.get_resource_node("/s1");
    assert!(matches!(result, Err(VfsError::Backend { .. })));
}

#[test]
fn test_index_not_found_is_not_a_miss() {
    let env: TestEnv = default_env();
    env.index.fail_with(missing_index);

    let root: ResourceNode = node(&env, "/");
    assert!(matches!(
        root.list_child_names(),
        Err(VfsError::Backend {
            source: StorageError::NotFound { .. },
            ..
        })
    ));

    let result = env.provider.get_resource_node("/s1");
    assert!(matches!(result, Err(VfsError::Backend { .. })));
}
