//! Open files and their submission points.
//!
//! A [`FileHandle`] is a cheap, clonable reference to one open file. All clones
//! share one canonical record; the record stays registered with its engine
//! (and resolvable through [`Engine::handle`](crate::Engine::handle)) until its
//! close executes.
//!
//! Once a close has been accepted the handle is invalid for every further
//! submission, even while earlier operations are still running. Those earlier
//! Outcomes keep identifying the handle.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::buffer::IoBuffer;
use crate::engine::EngineShared;
use crate::engine::dispatch::{self, CloseRequest, Sink, Transfer};
use crate::error::SubmitError;
use crate::last_error;
use crate::mode::OpenMode;
use crate::outcome::{Tag, TaskKind};
use crate::queue::CompletionQueue;

/// Stable identifier of an opened file; never reused within one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the numeric value of this handle id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Close submitted automatically when the last [`FileHandle`] is dropped while
/// the handle is still open.
#[derive(Clone, Debug)]
pub struct ClosePolicy {
    /// Queue receiving the close Outcome.
    pub queue: CompletionQueue,
    /// Whether to sync data to storage before closing.
    pub flush: bool,
    /// Tag echoed on the close Outcome.
    pub tag: Tag,
}

impl ClosePolicy {
    /// A non-flushing, untagged close delivered to `queue`.
    #[must_use]
    pub fn new(queue: CompletionQueue) -> Self {
        Self {
            queue,
            flush: false,
            tag: Tag::None,
        }
    }

    /// Sets the flush flag.
    #[must_use]
    pub const fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    /// Sets the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }
}

#[derive(Default)]
pub(crate) struct HandleState {
    /// A close has been accepted.
    pub(crate) closing: bool,
    /// The close has executed.
    pub(crate) closed: bool,
    /// Reads and writes accepted but not yet delivered.
    pub(crate) pending: usize,
    /// Close waiting for `pending` to reach zero.
    pub(crate) deferred_close: Option<CloseRequest>,
}

/// Engine-side record of an open file, shared with in-flight operations.
pub(crate) struct HandleCore {
    pub(crate) id: HandleId,
    path: PathBuf,
    mode: OpenMode,
    file: Mutex<Option<Arc<File>>>,
    state: Mutex<HandleState>,
    pub(crate) guard: Weak<HandleGuard>,
    pub(crate) engine: Arc<EngineShared>,
}

impl HandleCore {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_file(&self) -> MutexGuard<'_, Option<Arc<File>>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The open file, or `None` once the close has executed.
    pub(crate) fn file(&self) -> Option<Arc<File>> {
        self.lock_file().clone()
    }

    pub(crate) fn take_file(&self) -> Option<Arc<File>> {
        self.lock_file().take()
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.lock_state().closing
    }
}

/// Canonical wrapper shared by every clone of a [`FileHandle`].
///
/// Dropping the last one while the handle is still open submits a close.
pub(crate) struct HandleGuard {
    core: Arc<HandleCore>,
    policy: Mutex<Option<ClosePolicy>>,
}

impl HandleGuard {
    pub(crate) fn new_cyclic(
        id: HandleId,
        path: PathBuf,
        mode: OpenMode,
        file: File,
        engine: Arc<EngineShared>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|guard| Self {
            core: Arc::new(HandleCore {
                id,
                path,
                mode,
                file: Mutex::new(Some(Arc::new(file))),
                state: Mutex::new(HandleState::default()),
                guard: guard.clone(),
                engine,
            }),
            policy: Mutex::new(None),
        })
    }

    fn lock_policy(&self) -> MutexGuard<'_, Option<ClosePolicy>> {
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if !self.core.is_valid() {
            return;
        }
        let policy = self
            .policy
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let request = match policy {
            Some(policy) => CloseRequest::new(policy.flush, Sink::Queue(policy.queue), policy.tag),
            None => {
                logging::trace_close!(
                    handle = %self.core.id,
                    path = %self.core.path.display(),
                    "last reference dropped while open; closing detached"
                );
                CloseRequest::new(false, Sink::Discard, Tag::None)
            }
        };
        if let Err(error) = dispatch::submit_close(&self.core, request) {
            logging::trace_close!(handle = %self.core.id, %error, "implicit close not accepted");
        }
    }
}

/// An open file accepting asynchronous reads, writes and a close.
///
/// # Example
///
/// ```no_run
/// use aio::{CompletionQueue, Engine, EngineConfig, IoBuffer, OpenMode, Tag, Timeout};
///
/// let engine = Engine::new(EngineConfig::default())?;
/// let queue = CompletionQueue::new();
/// let handle = engine.open("out.bin", OpenMode::Write)?;
///
/// handle.submit_write(IoBuffer::from(b"hello".to_vec()), 0, &queue, Tag::Value(1))?;
/// handle.submit_close(true, &queue, Tag::Value(2))?;
///
/// for _ in 0..2 {
///     let mut outcome = queue.try_wait_next(Timeout::INFINITE).unwrap();
///     assert!(outcome.is_success());
///     outcome.release();
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct FileHandle {
    guard: Arc<HandleGuard>,
}

impl FileHandle {
    pub(crate) const fn from_guard(guard: Arc<HandleGuard>) -> Self {
        Self { guard }
    }

    pub(crate) fn core(&self) -> &Arc<HandleCore> {
        &self.guard.core
    }

    /// The handle's id.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.guard.core.id
    }

    /// The path the handle was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.guard.core.path
    }

    /// The access mode.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.guard.core.mode
    }

    /// `false` from the moment a close has been accepted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.guard.core.is_valid()
    }

    /// Operations accepted against this handle whose Outcome has not been
    /// delivered, counting an accepted close until it executes.
    #[must_use]
    pub fn pending(&self) -> usize {
        let state = self.guard.core.lock_state();
        state.pending + usize::from(state.closing && !state.closed)
    }

    /// Current file length in bytes, or `-1` if it cannot be determined
    /// (including after the close has executed).
    #[must_use]
    pub fn size(&self) -> i64 {
        self.try_size()
            .map_or(-1, |len| i64::try_from(len).unwrap_or(i64::MAX))
    }

    /// Current file length in bytes.
    pub fn try_size(&self) -> io::Result<u64> {
        let file = self
            .guard
            .core
            .file()
            .ok_or_else(|| io::Error::other("handle is closed"))?;
        Ok(file.metadata()?.len())
    }

    /// Reads up to `buffer.len()` bytes at `offset` into `buffer`.
    ///
    /// `Ok` means the read was accepted and exactly one Outcome will reach
    /// `queue`. On `Err` nothing was started and no Outcome will arrive.
    pub fn submit_read(
        &self,
        buffer: IoBuffer,
        offset: u64,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        if !self.mode().readable() {
            return Err(self.reject(SubmitError::NotReadable));
        }
        if !buffer.is_mutable() {
            return Err(self.reject(SubmitError::ImmutableBuffer));
        }
        let transfer = Transfer::new(TaskKind::Read, buffer, offset);
        dispatch::submit_transfer(self.core(), transfer, Sink::Queue(queue.clone()), tag)
            .map_err(|error| self.reject(error))
    }

    /// Reads up to `len` bytes at `offset` into an engine-allocated buffer
    /// that the Outcome owns.
    pub fn submit_read_alloc(
        &self,
        len: usize,
        offset: u64,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        if len == 0 {
            return Err(self.reject(SubmitError::EmptyBuffer));
        }
        if !self.mode().readable() {
            return Err(self.reject(SubmitError::NotReadable));
        }
        let buffer = IoBuffer::pooled(self.core().engine.buffers.acquire(len));
        let transfer = Transfer::new(TaskKind::Read, buffer, offset);
        dispatch::submit_transfer(self.core(), transfer, Sink::Queue(queue.clone()), tag)
            .map_err(|error| self.reject(error))
    }

    /// Writes all of `buffer` at `offset`.
    ///
    /// A short write shows up as `transferred < requested` on the Outcome.
    pub fn submit_write(
        &self,
        buffer: IoBuffer,
        offset: u64,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        if !self.mode().writable() {
            return Err(self.reject(SubmitError::NotWritable));
        }
        let transfer = Transfer::new(TaskKind::Write, buffer, offset);
        dispatch::submit_transfer(self.core(), transfer, Sink::Queue(queue.clone()), tag)
            .map_err(|error| self.reject(error))
    }

    /// Closes the handle once every previously accepted operation on it has
    /// delivered its Outcome.
    ///
    /// With `flush`, a successful close Outcome means written data reached
    /// storage. On `Ok` the handle is immediately invalid; on `Err` nothing
    /// happened and the handle stays usable.
    pub fn submit_close(
        &self,
        flush: bool,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        let request = CloseRequest::new(flush, Sink::Queue(queue.clone()), tag);
        dispatch::submit_close(self.core(), request).map_err(|error| self.reject(error))
    }

    /// Installs the close submitted when the last reference is dropped while
    /// the handle is still open.
    pub fn set_close_policy(&self, policy: ClosePolicy) {
        *self.guard.lock_policy() = Some(policy);
    }

    /// Removes the close policy; a dropped open handle then closes detached.
    pub fn clear_close_policy(&self) {
        *self.guard.lock_policy() = None;
    }

    fn reject(&self, error: SubmitError) -> SubmitError {
        last_error::record(&error);
        logging::trace_reject!(handle = %self.id(), %error, "submission rejected");
        error
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.guard, &other.guard)
    }
}

impl Eq for FileHandle {}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.id())
            .field("path", &self.path())
            .field("mode", &self.mode())
            .field("valid", &self.is_valid())
            .finish()
    }
}
