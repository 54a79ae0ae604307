//! Configuration options for the bag browser.

use crate::executor::ExecutorConfig;

/// How to resolve a name that is both a file and a directory in one bag level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The directory is reachable and the file is not.
    #[default]
    DirectoryWins,
    /// Resolving the name fails with `VfsError::AmbiguousEntry`.
    Reject,
}

/// Minimum bytes a content reader pulls per executor round-trip.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256 * 1024;

/// Options for the bag browser.
#[derive(Debug, Clone)]
pub struct VfsOptions {
    /// Treat dot-prefixed names as absent (suppresses desktop client probes
    /// for `.DS_Store`, `._*`, `desktop.ini`-style files).
    pub hide_dot_files: bool,
    /// File/directory name collision handling.
    pub collision_policy: CollisionPolicy,
    /// Minimum bytes a content reader pulls per executor round-trip.
    pub read_chunk_size: usize,
    /// Background executor settings.
    pub executor: ExecutorConfig,
}

impl Default for VfsOptions {
    fn default() -> Self {
        Self {
            hide_dot_files: true,
            collision_policy: CollisionPolicy::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            executor: ExecutorConfig::default(),
        }
    }
}

impl VfsOptions {
    /// Show or hide dot-prefixed names.
    ///
    /// # Arguments
    /// * `hide` - Whether dot-prefixed names resolve to NotFound
    pub fn with_hide_dot_files(mut self, hide: bool) -> Self {
        self.hide_dot_files = hide;
        self
    }

    /// Set the collision policy.
    ///
    /// # Arguments
    /// * `policy` - How to resolve file/directory name collisions
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the read chunk size.
    ///
    /// # Arguments
    /// * `read_chunk_size` - Minimum bytes per round-trip (0 is treated as 1)
    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    /// Set the executor configuration.
    ///
    /// # Arguments
    /// * `executor` - Executor settings
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Check whether a path segment is hidden under these options.
    ///
    /// # Arguments
    /// * `name` - A single path segment
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hide_dot_files && name.starts_with('.')
    }
}
