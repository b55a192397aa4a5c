//! Engine configuration and presets.

use crate::buffer_pool::{DEFAULT_POOL_BUFFER_CAPACITY, DEFAULT_POOL_BUFFERS};
use crate::error::AioError;

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "aio-worker";

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Worker threads executing transfers; 0 uses the available parallelism.
    pub worker_threads: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Reads and writes accepted but not yet delivered before submissions
    /// fail with `Busy`; 0 means unlimited. Closes are never limited.
    pub max_outstanding: usize,
    /// Engine-allocated buffers kept for reuse.
    pub pool_buffers: usize,
    /// Largest engine-allocated buffer kept for reuse.
    pub pool_buffer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_owned(),
            max_outstanding: 0,
            pool_buffers: DEFAULT_POOL_BUFFERS,
            pool_buffer_capacity: DEFAULT_POOL_BUFFER_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Creates a config tuned for many small files.
    #[must_use]
    pub fn for_small_files() -> Self {
        Self {
            pool_buffers: 64,
            pool_buffer_capacity: 64 * 1024, // 64 KB
            ..Self::default()
        }
    }

    /// Creates a config tuned for large sequential transfers.
    #[must_use]
    pub fn for_large_files() -> Self {
        Self {
            max_outstanding: 256,
            pool_buffers: 8,
            pool_buffer_capacity: 8 * 1024 * 1024, // 8 MB
            ..Self::default()
        }
    }

    /// Creates a config with one worker; completions then follow submission
    /// order, which is convenient for deterministic tests.
    #[must_use]
    pub fn single_threaded() -> Self {
        Self {
            worker_threads: 1,
            ..Self::default()
        }
    }

    /// Sets the worker thread count.
    #[must_use]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the outstanding-operation limit.
    #[must_use]
    pub const fn with_max_outstanding(mut self, limit: usize) -> Self {
        self.max_outstanding = limit;
        self
    }

    /// Sets the buffer pool limits.
    #[must_use]
    pub const fn with_pool(mut self, buffers: usize, capacity: usize) -> Self {
        self.pool_buffers = buffers;
        self.pool_buffer_capacity = capacity;
        self
    }

    /// Worker count after resolving 0 to the available parallelism.
    #[must_use]
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4)
    }

    pub(crate) fn validate(&self) -> Result<(), AioError> {
        if self.thread_name_prefix.is_empty() {
            return Err(AioError::Config(
                "thread name prefix must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
