//! The engine: worker pool, handle registry and submission protocol.
//!
//! # Design
//!
//! - Transfers execute on a dedicated `rayon` pool using positional I/O, so
//!   operations on one handle never share a file cursor.
//! - Closes never wait on a thread. A close accepted while transfers are
//!   outstanding is parked on the handle and run by whichever worker finishes
//!   the last of them (see [`dispatch`]).
//! - [`Engine::shutdown`] flips one flag. Transfers that have not started yet
//!   complete as [`OutcomeStatus::Cancelled`](crate::OutcomeStatus::Cancelled);
//!   closes still run so files are released.

mod config;
pub(crate) mod dispatch;
mod stats;


pub use config::{DEFAULT_THREAD_NAME_PREFIX, EngineConfig};
pub use stats::EngineStats;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::buffer_pool::BufferPool;
use crate::error::{AioError, IoResultExt, SubmitError};
use crate::handle::{FileHandle, HandleGuard, HandleId};
use crate::last_error;
use crate::mode::OpenMode;
use crate::registry::HandleRegistry;
use stats::StatsCounters;

/// State shared by the engine, its handles and in-flight operations.
pub(crate) struct EngineShared {
    config: EngineConfig,
    pub(crate) workers: rayon::ThreadPool,
    pub(crate) buffers: Arc<BufferPool>,
    pub(crate) registry: HandleRegistry,
    pub(crate) stats: StatsCounters,
    shutdown: AtomicBool,
    outstanding: AtomicUsize,
}

impl EngineShared {
    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Claims one slot under `max_outstanding`.
    pub(crate) fn reserve_slot(&self) -> Result<(), SubmitError> {
        let limit = self.config.max_outstanding;
        if limit == 0 {
            self.outstanding.fetch_add(1, Ordering::AcqRel);
            return Ok(());
        }
        self.outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < limit).then_some(current + 1)
            })
            .map(|_| ())
            .map_err(|_| SubmitError::Busy { limit })
    }

    pub(crate) fn release_slot(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

/// An asynchronous file I/O engine.
///
/// Dropping the engine shuts it down; handles opened from it remain closable.
///
/// # Example
///
/// ```no_run
/// use aio::{CompletionQueue, Engine, EngineConfig, OpenMode, Tag, Timeout};
///
/// let engine = Engine::new(EngineConfig::for_small_files())?;
/// let queue = CompletionQueue::new();
///
/// let handle = engine.open("input.bin", OpenMode::Read)?;
/// handle.submit_read_alloc(4096, 0, &queue, Tag::None)?;
/// handle.submit_close(false, &queue, Tag::None)?;
///
/// let mut batch = Vec::new();
/// while batch.len() < 2 {
///     queue.try_wait_next_batch(&mut batch, 2, Timeout::INFINITE);
/// }
/// for mut outcome in batch {
///     outcome.release();
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Engine {
    shared: Arc<EngineShared>,
}

impl Engine {
    /// Starts an engine with its own worker pool.
    pub fn new(config: EngineConfig) -> Result<Self, AioError> {
        config.validate()?;
        let threads = config.resolved_worker_threads();
        let prefix = config.thread_name_prefix.clone();
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()
            .map_err(|e| AioError::ThreadPool(e.to_string()))?;

        let buffers = Arc::new(BufferPool::new(
            config.pool_buffers,
            config.pool_buffer_capacity,
        ));
        logging::trace_engine!(
            threads,
            max_outstanding = config.max_outstanding,
            "engine started"
        );

        Ok(Self {
            shared: Arc::new(EngineShared {
                config,
                workers,
                buffers,
                registry: HandleRegistry::new(),
                stats: StatsCounters::default(),
                shutdown: AtomicBool::new(false),
                outstanding: AtomicUsize::new(0),
            }),
        })
    }

    /// Starts an engine with [`EngineConfig::default`].
    pub fn with_defaults() -> Result<Self, AioError> {
        Self::new(EngineConfig::default())
    }

    /// The configuration the engine was started with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// The pool backing engine-allocated buffers.
    #[must_use]
    pub fn buffer_pool(&self) -> &BufferPool {
        &self.shared.buffers
    }

    /// Opens `path` synchronously.
    ///
    /// This is the only blocking call on the submission side. Failures are
    /// returned and also recorded in the thread's last-error slot.
    pub fn open(&self, path: impl AsRef<Path>, mode: OpenMode) -> Result<FileHandle, AioError> {
        let path = path.as_ref();
        let file = mode
            .to_open_options()
            .open(path)
            .with_path(path)
            .inspect_err(|error| {
                last_error::record(error);
                logging::trace_open!(path = %path.display(), %mode, %error, "open failed");
            })?;

        let id = self.shared.registry.allocate();
        let guard = HandleGuard::new_cyclic(
            id,
            path.to_path_buf(),
            mode,
            file,
            Arc::clone(&self.shared),
        );
        self.shared.registry.insert(id, &guard);
        logging::trace_open!(handle = %id, path = %path.display(), %mode, "opened");
        Ok(FileHandle::from_guard(guard))
    }

    /// Opens `path` with a mode string such as `"r"` or `"w+x"`.
    pub fn open_str(&self, path: impl AsRef<Path>, mode: &str) -> Result<FileHandle, AioError> {
        let mode = OpenMode::parse(mode).map_err(|error| {
            let error = AioError::from(error);
            last_error::record(&error);
            error
        })?;
        self.open(path, mode)
    }

    /// Resolves a handle id, if the handle is open and still referenced.
    #[must_use]
    pub fn handle(&self, id: HandleId) -> Option<FileHandle> {
        self.shared.registry.resolve(id).map(FileHandle::from_guard)
    }

    /// Stops accepting reads and writes. Idempotent.
    ///
    /// Transfers that have not started complete as cancelled; closes, whether
    /// already accepted or submitted later, still run.
    pub fn shutdown(&self) {
        if !self.shared.shutdown.swap(true, Ordering::AcqRel) {
            logging::trace_engine!(
                open_handles = self.shared.registry.len(),
                "engine shutting down"
            );
        }
    }

    /// Whether [`Engine::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.snapshot(self.shared.registry.len())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.shared.config)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
