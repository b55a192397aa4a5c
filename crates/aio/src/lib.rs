#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

//! # Overview
//!
//! `aio` is an asynchronous file I/O engine built on a submit/complete
//! protocol. Callers open a [`FileHandle`], submit reads, writes and a close
//! against it naming a [`CompletionQueue`], and later collect one [`Outcome`]
//! per accepted submission from that queue.
//!
//! # Guarantees
//!
//! - A submission that returns `Ok` produces exactly one Outcome, even when
//!   zero bytes move or the engine shuts down first.
//! - A close runs only after every operation submitted before it on the same
//!   handle has delivered its Outcome, and the handle is invalid for new
//!   submissions as soon as the close is accepted.
//! - For every Outcome, `transferred <= requested` and
//!   `outcome.buffer().len() == transferred`.
//! - Nothing else is ordered: operations on different handles, or concurrent
//!   operations on one handle, complete in whatever order the workers finish.
//!   Overlapping concurrent writes to one handle leave unspecified contents.
//!
//! # Errors
//!
//! Three channels stay separate. [`AioError`] reports synchronous open
//! failures. [`SubmitError`] reports submissions that never started; see
//! [`SubmitError::is_programmer_error`]. I/O failures after acceptance surface
//! only as [`OutcomeStatus::Failure`] on the Outcome. Every synchronous failure
//! is also recorded in a per-thread slot readable with [`last_error()`].
//!
//! # Examples
//!
//! ```no_run
//! use aio::{CompletionQueue, Tag, Timeout};
//!
//! let queue = CompletionQueue::new();
//! aio::load_file("Cargo.toml", &queue, Tag::None)?;
//!
//! let mut outcome = queue.try_wait_next(Timeout::INFINITE).expect("one outcome");
//! println!("{} bytes", outcome.buffer().len());
//! outcome.release();
//! # Ok::<(), aio::SubmitError>(())
//! ```

mod buffer;
mod buffer_pool;
mod engine;
mod error;
mod handle;
mod last_error;
mod load;
mod mode;
mod outcome;
mod queue;
mod registry;
mod sys;

use std::path::Path;
use std::sync::OnceLock;

pub use buffer::{IoBuffer, PooledBytes, RawBuffer};
pub use buffer_pool::{BufferPool, DEFAULT_POOL_BUFFER_CAPACITY, DEFAULT_POOL_BUFFERS};
pub use engine::{DEFAULT_THREAD_NAME_PREFIX, Engine, EngineConfig, EngineStats};
pub use error::{AioError, ModeError, SubmitError, TimeoutError};
pub use handle::{ClosePolicy, FileHandle, HandleId};
pub use last_error::{clear_last_error, last_error, take_last_error};
pub use mode::OpenMode;
pub use outcome::{Outcome, OutcomeStatus, Tag, TaskKind};
pub use queue::{CompletionQueue, Timeout};

static DEFAULT_ENGINE: OnceLock<Engine> = OnceLock::new();

/// The process-wide engine, started with [`EngineConfig::default`] on first use.
pub fn default_engine() -> Result<&'static Engine, AioError> {
    if let Some(engine) = DEFAULT_ENGINE.get() {
        return Ok(engine);
    }
    let engine = Engine::with_defaults()?;
    Ok(DEFAULT_ENGINE.get_or_init(|| engine))
}

/// Opens `path` on the default engine with a mode string such as `"r+"`.
pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<FileHandle, AioError> {
    default_engine()?.open_str(path, mode)
}

/// [`Engine::load_file`] on the default engine.
pub fn load_file(
    path: impl AsRef<Path>,
    queue: &CompletionQueue,
    tag: Tag,
) -> Result<(), SubmitError> {
    default_engine()?.load_file(path, queue, tag)
}

/// [`Engine::save_file`] on the default engine.
pub fn save_file(
    path: impl AsRef<Path>,
    data: impl Into<IoBuffer>,
    flush: bool,
    queue: &CompletionQueue,
    tag: Tag,
) -> Result<(), SubmitError> {
    default_engine()?.save_file(path, data, flush, queue, tag)
}
