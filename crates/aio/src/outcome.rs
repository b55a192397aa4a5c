//! Completion records delivered through a [`CompletionQueue`](crate::CompletionQueue).

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::{Arc, Weak};

use crate::buffer::IoBuffer;
use crate::buffer_pool::BufferPool;
use crate::handle::{FileHandle, HandleGuard, HandleId};

/// The operation an Outcome reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskKind {
    /// A positional read.
    Read,
    /// A positional write.
    Write,
    /// A close, optionally flushing to storage first.
    Close,
}

impl TaskKind {
    /// Lower-case name used in traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an accepted operation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutcomeStatus {
    /// The operation ran; short transfers are still successes.
    Success,
    /// The operation ran and hit an I/O error.
    Failure,
    /// The engine shut down before the operation started.
    Cancelled,
}

/// Caller-supplied correlation value echoed back on the Outcome.
#[derive(Clone, Default)]
pub enum Tag {
    /// No tag.
    #[default]
    None,
    /// A plain integer, typically an index or offset.
    Value(u64),
    /// Any shared value; the Outcome holds a reference until release.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Tag {
    /// Wraps an arbitrary value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// The integer payload, if any.
    #[must_use]
    pub const fn value(&self) -> Option<u64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Downcasts an object payload.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns `true` when no tag was supplied.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<u64> for Tag {
    fn from(value: u64) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// The result of exactly one accepted operation.
///
/// An Outcome holds the operation's buffer until it is released. Call
/// [`Outcome::release`] (or take the buffer with [`Outcome::into_buffer`]) as
/// soon as the data has been consumed. Dropping an unreleased Outcome releases
/// it too, but logs the fact: resource lifetime then depends on where the value
/// happens to be dropped.
pub struct Outcome {
    kind: TaskKind,
    status: OutcomeStatus,
    error: Option<io::Error>,
    handle_id: HandleId,
    handle: Weak<HandleGuard>,
    buffer: Option<IoBuffer>,
    requested: usize,
    transferred: usize,
    offset: u64,
    tag: Tag,
    pool: Option<Arc<BufferPool>>,
    released: bool,
}

/// Fields a worker fills in before handing an Outcome to its queue.
pub(crate) struct OutcomeParts {
    pub(crate) kind: TaskKind,
    pub(crate) status: OutcomeStatus,
    pub(crate) error: Option<io::Error>,
    pub(crate) handle_id: HandleId,
    pub(crate) handle: Weak<HandleGuard>,
    pub(crate) buffer: Option<IoBuffer>,
    pub(crate) requested: usize,
    pub(crate) transferred: usize,
    pub(crate) offset: u64,
    pub(crate) tag: Tag,
    pub(crate) pool: Option<Arc<BufferPool>>,
}

impl Outcome {
    pub(crate) fn from_parts(parts: OutcomeParts) -> Self {
        debug_assert!(parts.transferred <= parts.requested);
        Self {
            kind: parts.kind,
            status: parts.status,
            error: parts.error,
            handle_id: parts.handle_id,
            handle: parts.handle,
            buffer: parts.buffer,
            requested: parts.requested,
            transferred: parts.transferred.min(parts.requested),
            offset: parts.offset,
            tag: parts.tag,
            pool: parts.pool,
            released: false,
        }
    }

    /// The operation this Outcome reports on.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// How the operation ended.
    #[must_use]
    pub const fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Shorthand for `status() == OutcomeStatus::Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// The I/O error behind a [`OutcomeStatus::Failure`].
    #[must_use]
    pub const fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Removes and returns the I/O error.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Id of the handle the operation ran against.
    #[must_use]
    pub const fn handle_id(&self) -> HandleId {
        self.handle_id
    }

    /// Resolves the handle, if any caller still holds a reference to it.
    ///
    /// The result is for identification only; a handle resolved from a close
    /// Outcome is no longer valid for submissions.
    #[must_use]
    pub fn handle(&self) -> Option<FileHandle> {
        self.handle.upgrade().map(FileHandle::from_guard)
    }

    /// The transferred bytes: data read for reads, the written source prefix
    /// for writes, empty for closes and released Outcomes.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        self.buffer
            .as_ref()
            .map_or(&[][..], |buffer| &buffer.as_slice()[..self.transferred])
    }

    /// Bytes the operation asked for.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Bytes actually moved; never more than [`Outcome::requested`].
    #[must_use]
    pub const fn transferred(&self) -> usize {
        self.transferred
    }

    /// File offset the operation started at.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// The submission's tag; [`Tag::None`] after release.
    #[must_use]
    pub const fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Removes and returns the tag.
    pub fn take_tag(&mut self) -> Tag {
        std::mem::take(&mut self.tag)
    }

    /// Whether [`Outcome::release`] has run.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Frees the engine-allocated buffer, drops retained caller buffers and
    /// detaches the tag. Later calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(buffer) = self.buffer.take() {
            match (buffer, self.pool.take()) {
                (IoBuffer::Pooled(bytes), Some(pool)) => pool.recycle(bytes.into_inner()),
                (other, _) => drop(other),
            }
        }
        self.tag = Tag::None;
        self.pool = None;
    }

    /// Takes the buffer out and releases the rest of the Outcome.
    ///
    /// The returned buffer has its full submitted length; only the first
    /// [`Outcome::transferred`] bytes carry data. Engine-allocated buffers are
    /// handed over as [`IoBuffer::Pooled`] and no longer return to the pool.
    pub fn into_buffer(mut self) -> Option<IoBuffer> {
        let buffer = self.buffer.take();
        self.release();
        buffer
    }

    /// Marks the Outcome released without tracing; used when the engine
    /// discards Outcomes nobody asked for.
    pub(crate) fn discard(mut self) {
        self.release();
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("handle", &self.handle_id)
            .field("requested", &self.requested)
            .field("transferred", &self.transferred)
            .field("offset", &self.offset)
            .field("tag", &self.tag)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for Outcome {
    fn drop(&mut self) {
        if !self.released {
            logging::warn_implicit_release!(
                handle = %self.handle_id,
                kind = %self.kind,
                "outcome dropped without release"
            );
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(buffer: IoBuffer, transferred: usize, pool: Option<Arc<BufferPool>>) -> Outcome {
        let requested = buffer.len();
        Outcome::from_parts(OutcomeParts {
            kind: TaskKind::Read,
            status: OutcomeStatus::Success,
            error: None,
            handle_id: HandleId::from_raw(7),
            handle: Weak::new(),
            buffer: Some(buffer),
            requested,
            transferred,
            offset: 0,
            tag: Tag::Value(3),
            pool,
        })
    }

    #[test]
    fn buffer_view_matches_transferred() {
        let mut outcome = outcome(IoBuffer::Owned(b"hello world".to_vec()), 5, None);
        assert_eq!(outcome.buffer(), b"hello");
        assert_eq!(outcome.buffer().len(), outcome.transferred());
        outcome.release();
    }

    #[test]
    fn release_is_idempotent() {
        let pool = Arc::new(BufferPool::new(4, 1024));
        let mut outcome = outcome(IoBuffer::pooled(pool.acquire(64)), 64, Some(Arc::clone(&pool)));

        outcome.release();
        assert!(outcome.is_released());
        assert_eq!(pool.available(), 1);
        assert!(outcome.tag().is_none());
        assert!(outcome.buffer().is_empty());

        outcome.release();
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn drop_releases_pooled_buffer() {
        let pool = Arc::new(BufferPool::new(4, 1024));
        drop(outcome(IoBuffer::pooled(pool.acquire(8)), 8, Some(Arc::clone(&pool))));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn release_drops_shared_retention() {
        let shared: Arc<[u8]> = Arc::from(&b"data"[..]);
        let mut outcome = outcome(IoBuffer::Shared(Arc::clone(&shared)), 4, None);
        assert_eq!(Arc::strong_count(&shared), 2);
        outcome.release();
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn into_buffer_hands_over_allocation() {
        let pool = Arc::new(BufferPool::new(4, 1024));
        let outcome = outcome(IoBuffer::pooled(pool.acquire(16)), 10, Some(Arc::clone(&pool)));
        let buffer = outcome.into_buffer().unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn unresolvable_handle_is_none() {
        let mut outcome = outcome(IoBuffer::zeroed(1), 0, None);
        assert!(outcome.handle().is_none());
        assert_eq!(outcome.handle_id(), HandleId::from_raw(7));
        outcome.release();
    }

    #[test]
    fn tag_object_downcasts() {
        let tag = Tag::object(String::from("ctx"));
        assert_eq!(tag.downcast_ref::<String>().map(String::as_str), Some("ctx"));
        assert!(tag.downcast_ref::<u32>().is_none());
        assert_eq!(Tag::from(9).value(), Some(9));
    }
}
