//! Async executor for bridging synchronous provider calls with async backends.
//!
//! The provider contract is synchronous: the hosting protocol server runs one
//! resolution to completion on one of its own worker threads. The backends
//! (search index, bag API, blob storage) are async. This executor owns a
//! dedicated Tokio runtime on a background thread, separate from any ambient
//! runtime, and the calling thread blocks on a per-call oneshot channel.
//!
//! # Architecture
//!
//! ```text
//! Protocol Thread                Executor Thread
//! ───────────────                ───────────────
//!     │                               │
//!     │ submit(future) ──────────────►│
//!     │                               │ spawn task
//!     │ blocking_recv() ◄─────────────│ send result
//!     │                               │
//! ```
//!
//! No timeouts are applied here. Bounding backend latency belongs to the
//! backend clients and the hosting server.
//!
//! `block_on` must not be called from inside a Tokio runtime.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Errors that can occur during executor operations.
#[derive(Debug, Clone)]
pub enum ExecutorError {
    /// The runtime or its thread could not be started.
    Startup(String),
    /// The executor has been shut down or the background thread died.
    Shutdown,
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::Startup(msg) => write!(f, "Failed to start executor: {}", msg),
            ExecutorError::Shutdown => write!(f, "Executor has been shut down"),
        }
    }
}

impl std::error::Error for ExecutorError {}

/// Type-erased work item. The result travels through a typed oneshot
/// captured in the future.
struct WorkItem {
    work: BoxFuture<'static, ()>,
}

/// Configuration for the async executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Number of Tokio worker threads.
    pub worker_threads: usize,
    /// Channel buffer size for work submission.
    pub queue_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            queue_size: 1024,
        }
    }
}

impl ExecutorConfig {
    /// Create config with specified worker threads.
    ///
    /// # Arguments
    /// * `worker_threads` - Number of Tokio worker threads (0 is treated as 1)
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Create config with specified queue size.
    ///
    /// # Arguments
    /// * `queue_size` - Channel buffer size for work submission (0 is treated as 1)
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }
}

/// Async executor that runs in a dedicated background thread.
///
/// Callers submit work via a channel and block on a oneshot receiver, so the
/// calling thread never needs a runtime of its own.
pub struct AsyncExecutor {
    tx: mpsc::Sender<WorkItem>,
    cancel_token: CancellationToken,
    thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl AsyncExecutor {
    /// Create a new executor with a dedicated runtime thread.
    ///
    /// # Arguments
    /// * `config` - Executor configuration
    ///
    /// # Returns
    /// New executor instance with background thread running.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        let runtime: tokio::runtime::Runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("bags-io-worker")
            .enable_all()
            .build()
            .map_err(|e| ExecutorError::Startup(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<WorkItem>(config.queue_size.max(1));
        let cancel_token: CancellationToken = CancellationToken::new();
        let token_clone: CancellationToken = cancel_token.clone();
        let running: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
        let running_clone: Arc<AtomicBool> = running.clone();

        let thread: JoinHandle<()> = std::thread::Builder::new()
            .name("bags-async-executor".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut rx: mpsc::Receiver<WorkItem> = rx;

                    loop {
                        tokio::select! {
                            biased;

                            _ = token_clone.cancelled() => break,
                            item = rx.recv() => {
                                match item {
                                    Some(work_item) => {
                                        tokio::spawn(work_item.work);
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                });

                running_clone.store(false, Ordering::Release);
                tracing::debug!("bag executor stopped");
            })
            .map_err(|e| ExecutorError::Startup(e.to_string()))?;

        Ok(Self {
            tx,
            cancel_token,
            thread: Some(thread),
            running,
        })
    }

    /// Create executor with default settings (4 worker threads).
    pub fn with_defaults() -> Result<Self, ExecutorError> {
        Self::new(ExecutorConfig::default())
    }

    /// Execute an async operation and block until complete.
    ///
    /// # Arguments
    /// * `future` - The async operation to execute
    ///
    /// # Returns
    /// Ok(result) on success, Err on executor shutdown.
    pub fn block_on<F, T>(&self, future: F) -> Result<T, ExecutorError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if !self.running.load(Ordering::Acquire) {
            return Err(ExecutorError::Shutdown);
        }

        let (result_tx, result_rx) = oneshot::channel::<T>();

        let work: BoxFuture<'static, ()> = async move {
            let result: T = future.await;
            // Caller may have gone away.
            let _ = result_tx.send(result);
        }
        .boxed();

        if self.tx.blocking_send(WorkItem { work }).is_err() {
            return Err(ExecutorError::Shutdown);
        }

        // A dropped sender means the runtime went away with the task.
        result_rx.blocking_recv().map_err(|_| ExecutorError::Shutdown)
    }

    /// Stop accepting work and shut the runtime down.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the executor is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        self.cancel_token.cancel();

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
