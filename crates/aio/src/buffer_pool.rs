//! Recycling store for engine-allocated read buffers.
//!
//! Buffers leave the pool through [`BufferPool::acquire`] when an engine-sized
//! read is submitted and come back through [`BufferPool::recycle`] when the
//! Outcome carrying them is released.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of retained buffers.
pub const DEFAULT_POOL_BUFFERS: usize = 16;

/// Default largest capacity the pool keeps (1 MiB).
pub const DEFAULT_POOL_BUFFER_CAPACITY: usize = 1024 * 1024;

/// A thread-safe stack of reusable byte vectors.
///
/// Buffers larger than the capacity limit are freed rather than retained so
/// one whole-file load does not pin a large allocation for the process lifetime.
///
/// # Example
///
/// ```
/// use aio::BufferPool;
///
/// let pool = BufferPool::new(4, 4096);
/// let buffer = pool.acquire(1024);
/// assert_eq!(buffer.len(), 1024);
/// pool.recycle(buffer);
/// assert_eq!(pool.available(), 1);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_buffers: usize,
    max_capacity: usize,
}

impl BufferPool {
    /// Creates a pool retaining at most `max_buffers` vectors of at most
    /// `max_capacity` bytes each.
    #[must_use]
    pub fn new(max_buffers: usize, max_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(max_buffers)),
            max_buffers,
            max_capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a zeroed vector of exactly `len` bytes.
    ///
    /// The most recently recycled allocation with enough capacity is reused;
    /// otherwise a fresh vector is allocated.
    #[must_use]
    pub fn acquire(&self, len: usize) -> Vec<u8> {
        let reused = {
            let mut buffers = self.lock();
            buffers
                .iter()
                .rposition(|candidate| candidate.capacity() >= len)
                .map(|index| buffers.swap_remove(index))
        };

        match reused {
            Some(mut buffer) => {
                buffer.clear();
                buffer.resize(len, 0);
                buffer
            }
            None => vec![0u8; len],
        }
    }

    /// Offers a vector back to the pool.
    ///
    /// The vector is dropped when the pool is full or its capacity exceeds the
    /// retention limit.
    pub fn recycle(&self, buffer: Vec<u8>) {
        if buffer.capacity() == 0 || buffer.capacity() > self.max_capacity {
            return;
        }
        let mut buffers = self.lock();
        if buffers.len() < self.max_buffers {
            buffers.push(buffer);
        }
    }

    /// Number of buffers currently retained.
    #[must_use]
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Maximum number of retained buffers.
    #[must_use]
    pub const fn max_buffers(&self) -> usize {
        self.max_buffers
    }

    /// Largest capacity the pool will retain.
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_BUFFERS, DEFAULT_POOL_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquire_returns_zeroed_buffer() {
        let pool = BufferPool::new(4, 1024);
        let buffer = pool.acquire(100);
        assert_eq!(buffer.len(), 100);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn recycled_buffer_is_reused_and_zeroed() {
        let pool = BufferPool::new(4, 1024);
        let mut buffer = pool.acquire(64);
        buffer[0] = 42;
        let ptr = buffer.as_ptr();
        pool.recycle(buffer);
        assert_eq!(pool.available(), 1);

        let again = pool.acquire(32);
        assert_eq!(pool.available(), 0);
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(again.len(), 32);
        assert_eq!(again[0], 0);
    }

    #[test]
    fn small_allocations_are_skipped_for_large_requests() {
        let pool = BufferPool::new(4, 1024);
        pool.recycle(Vec::with_capacity(16));
        let buffer = pool.acquire(512);
        assert_eq!(buffer.len(), 512);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn pool_capacity_limit() {
        let pool = BufferPool::new(2, 1024);
        for _ in 0..3 {
            pool.recycle(vec![0u8; 8]);
        }
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let pool = BufferPool::new(2, 1024);
        pool.recycle(vec![0u8; 4096]);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn concurrent_access() {
        let pool = Arc::new(BufferPool::new(8, 1024));
        let mut handles = vec![];

        for _ in 0..16 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let mut buffer = pool.acquire(256);
                    buffer[0] = 1;
                    pool.recycle(buffer);
                }
            }));
        }

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert!(pool.available() <= 8);
    }
}
