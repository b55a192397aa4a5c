//! Error types for the engine.
//!
//! Three channels are kept apart:
//! - [`AioError`] for synchronous open and engine construction failures,
//! - [`SubmitError`] for submissions that were never accepted,
//! - the [`OutcomeStatus`](crate::OutcomeStatus) of a delivered
//!   [`Outcome`](crate::Outcome) for I/O that failed after acceptance.

use std::io;
use std::path::PathBuf;

/// An open mode string outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    /// The string is not one of `r`, `w`, `wx`, `r+`, `w+`, `w+x`.
    #[error("unsupported open mode {0:?} (expected r, w, wx, r+, w+ or w+x)")]
    Unsupported(String),
}

/// Synchronous failure of an open or of engine construction.
#[derive(Debug, thiserror::Error)]
pub enum AioError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// The path that was being opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The mode string was rejected.
    #[error(transparent)]
    Mode(#[from] ModeError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),

    /// The engine configuration is inconsistent.
    #[error("invalid engine configuration: {0}")]
    Config(String),
}

impl AioError {
    /// Creates an open error with path context.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}

/// Extension trait for mapping I/O results to [`AioError::Open`] with path context.
pub(crate) trait IoResultExt<T> {
    /// Maps an I/O error to `AioError::Open` with the given path.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T, AioError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T, AioError> {
        self.map_err(|e| AioError::open(path, e))
    }
}

/// A submission that was not accepted; no Outcome will arrive for it.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The handle was closed, or a close has already been accepted for it.
    #[error("invalid handle: a close has already been submitted")]
    InvalidHandle,

    /// A read was submitted against a handle opened without read access.
    #[error("handle was not opened for reading")]
    NotReadable,

    /// A write was submitted against a handle opened without write access.
    #[error("handle was not opened for writing")]
    NotWritable,

    /// An engine-allocated read was requested with a zero length.
    #[error("buffer length must be positive")]
    EmptyBuffer,

    /// A read was submitted into a shared, immutable buffer.
    #[error("cannot read into a shared immutable buffer")]
    ImmutableBuffer,

    /// The engine's outstanding-operation limit is reached; retry later.
    #[error("engine busy: {limit} operations already outstanding")]
    Busy {
        /// The configured limit.
        limit: usize,
    },

    /// The engine is shutting down and accepts no new work.
    #[error("engine is shutting down")]
    ShuttingDown,

    /// A convenience form could not open its file.
    #[error(transparent)]
    Open(#[from] AioError),
}

impl SubmitError {
    /// Returns `true` for misuse that retrying cannot fix.
    #[must_use]
    pub const fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandle
                | Self::NotReadable
                | Self::NotWritable
                | Self::EmptyBuffer
                | Self::ImmutableBuffer
        )
    }

    /// Returns `true` when the same submission may succeed later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// A timeout value outside the representable nanosecond range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    /// Negative durations are rejected.
    #[error("timeout must not be negative")]
    Negative,

    /// The value does not fit in a signed 64-bit nanosecond count.
    #[error("timeout overflows the nanosecond range")]
    Overflow,
}
