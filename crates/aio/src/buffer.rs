//! Buffers handed to read and write submissions.
//!
//! An [`IoBuffer`] travels with its operation to the worker thread and comes
//! back inside the [`Outcome`](crate::Outcome). Releasing the Outcome is what
//! ends the engine's hold on it:
//!
//! | Variant  | Who allocates | Release action                     |
//! |----------|---------------|------------------------------------|
//! | `Owned`  | caller        | dropped (or returned by `into_buffer`) |
//! | `Shared` | caller        | retaining reference dropped        |
//! | `Raw`    | caller        | nothing; caller owns the memory    |
//! | `Pooled` | engine        | recycled into the engine's pool    |

use std::fmt;
use std::sync::Arc;

/// Caller-managed memory region used by [`IoBuffer::Raw`].
///
/// Only constructible through [`IoBuffer::from_raw_parts`].
pub struct RawBuffer {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: the constructor's contract makes the caller guarantee the region
// stays valid and unaliased until the owning Outcome is released, which is the
// only window in which the engine dereferences it from another thread.
unsafe impl Send for RawBuffer {}
// SAFETY: see the `Send` impl; shared access only produces `&[u8]`.
unsafe impl Sync for RawBuffer {}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Bytes allocated by the engine for [`IoBuffer::Pooled`].
///
/// Only the engine creates these, so a caller's own vector can never be
/// recycled into the engine's pool. Use [`IoBuffer::into_vec`] to take the
/// bytes out.
#[derive(Debug)]
pub struct PooledBytes(Vec<u8>);

impl PooledBytes {
    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// A buffer passed to [`FileHandle::submit_read`](crate::FileHandle::submit_read)
/// or [`FileHandle::submit_write`](crate::FileHandle::submit_write).
#[derive(Debug)]
pub enum IoBuffer {
    /// Caller-allocated vector moved into the engine.
    Owned(Vec<u8>),
    /// Shared immutable bytes; valid as a write source only.
    Shared(Arc<[u8]>),
    /// Caller-managed memory. See [`IoBuffer::from_raw_parts`].
    Raw(RawBuffer),
    /// Engine-allocated memory owned by the resulting Outcome.
    Pooled(PooledBytes),
}

impl IoBuffer {
    /// Wraps caller-managed memory.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes from the moment
    /// of submission until the matching Outcome is released or dropped. The
    /// caller must not access the region in the meantime.
    #[must_use]
    pub const unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Self {
        Self::Raw(RawBuffer { ptr, len })
    }

    pub(crate) const fn pooled(bytes: Vec<u8>) -> Self {
        Self::Pooled(PooledBytes(bytes))
    }

    /// Allocates a zeroed owned buffer of `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::Owned(vec![0u8; len])
    }

    /// Length of the region in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Owned(v) | Self::Pooled(PooledBytes(v)) => v.len(),
            Self::Shared(bytes) => bytes.len(),
            Self::Raw(raw) => raw.len,
        }
    }

    /// Returns `true` for a zero-length region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether reads may land in this buffer.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        !matches!(self, Self::Shared(_))
    }

    /// Whether the engine allocated this buffer.
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// Views the whole region.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(v) | Self::Pooled(PooledBytes(v)) => v,
            Self::Shared(bytes) => bytes,
            Self::Raw(raw) if raw.len == 0 => &[],
            // SAFETY: validity for `len` bytes is guaranteed by the
            // `from_raw_parts` contract for as long as this value exists.
            Self::Raw(raw) => unsafe { std::slice::from_raw_parts(raw.ptr, raw.len) },
        }
    }

    /// Views the whole region mutably, or `None` for shared buffers.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            Self::Owned(v) | Self::Pooled(PooledBytes(v)) => Some(v),
            Self::Shared(_) => None,
            Self::Raw(raw) if raw.len == 0 => Some(&mut []),
            // SAFETY: as for `as_slice`; exclusivity comes from `&mut self`
            // plus the caller's promise not to touch the region.
            Self::Raw(raw) => Some(unsafe { std::slice::from_raw_parts_mut(raw.ptr, raw.len) }),
        }
    }

    /// Converts into a vector, copying only for shared and raw regions.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        match self {
            Self::Owned(v) | Self::Pooled(PooledBytes(v)) => v,
            Self::Shared(bytes) => bytes.to_vec(),
            raw @ Self::Raw(_) => raw.as_slice().to_vec(),
        }
    }
}

impl From<Vec<u8>> for IoBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes)
    }
}

impl From<Arc<[u8]>> for IoBuffer {
    fn from(bytes: Arc<[u8]>) -> Self {
        Self::Shared(bytes)
    }
}

impl From<&[u8]> for IoBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::Shared(Arc::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_buffers_are_immutable() {
        let mut shared = IoBuffer::from(&b"abc"[..]);
        assert!(!shared.is_mutable());
        assert!(shared.as_mut_slice().is_none());
        assert_eq!(shared.as_slice(), b"abc");
    }

    #[test]
    fn raw_buffer_aliases_caller_memory() {
        let mut backing = [0u8; 4];
        let mut raw = unsafe { IoBuffer::from_raw_parts(backing.as_mut_ptr(), backing.len()) };
        raw.as_mut_slice().unwrap().copy_from_slice(b"wxyz");
        assert_eq!(raw.len(), 4);
        drop(raw);
        assert_eq!(&backing, b"wxyz");
    }

    #[test]
    fn into_vec_keeps_owned_allocation() {
        let vec = vec![1u8, 2, 3];
        let ptr = vec.as_ptr();
        let back = IoBuffer::Owned(vec).into_vec();
        assert_eq!(back.as_ptr(), ptr);
    }

    #[test]
    fn zeroed_has_requested_length() {
        let buffer = IoBuffer::zeroed(16);
        assert_eq!(buffer.len(), 16);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }
}
