//! Completion queues.
//!
//! A [`CompletionQueue`] collects [`Outcome`]s in the order their operations
//! finish. Any number of handles may target one queue and any number of threads
//! may wait on it; each Outcome is handed to exactly one waiter.
//!
//! The queue is reference counted. Every accepted operation holds its own clone
//! until it delivers, so the caller may drop its handle to the queue at any time.

mod timeout;


pub use timeout::Timeout;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::outcome::Outcome;

struct QueueState {
    outcomes: VecDeque<Outcome>,
    pending: usize,
}

struct QueueInner {
    name: Option<String>,
    state: Mutex<QueueState>,
    ready: Condvar,
}

/// An ordered sink for completed operations.
///
/// # Example
///
/// ```no_run
/// use aio::{CompletionQueue, IoBuffer, Tag, Timeout};
///
/// let queue = CompletionQueue::named("reads");
/// let handle = aio::open("data.bin", "r").unwrap();
/// handle.submit_read(IoBuffer::zeroed(4096), 0, &queue, Tag::None).unwrap();
///
/// let mut outcome = queue.try_wait_next(Timeout::INFINITE).unwrap();
/// println!("read {} bytes", outcome.transferred());
/// outcome.release();
/// ```
#[derive(Clone)]
pub struct CompletionQueue {
    inner: Arc<QueueInner>,
}

impl CompletionQueue {
    /// Creates an unnamed queue.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a queue whose name appears in traces.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                name,
                state: Mutex::new(QueueState {
                    outcomes: VecDeque::new(),
                    pending: 0,
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// The queue's name, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("-")
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outcomes ready to be taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().outcomes.len()
    }

    /// Returns `true` when no Outcome is ready.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().outcomes.is_empty()
    }

    /// Accepted operations targeting this queue whose Outcome has not been
    /// delivered yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Whether `self` and `other` are handles to the same queue.
    #[must_use]
    pub fn same_queue(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Takes the next ready Outcome without blocking.
    #[must_use]
    pub fn try_next(&self) -> Option<Outcome> {
        self.try_wait_next(Timeout::ZERO)
    }

    /// Waits for the next Outcome.
    ///
    /// `None` or [`Timeout::INFINITE`] waits indefinitely, [`Timeout::ZERO`]
    /// never blocks. Returns `None` when the timeout elapses first.
    pub fn try_wait_next(&self, timeout: impl Into<Option<Timeout>>) -> Option<Outcome> {
        let mut state = self.wait_ready(timeout.into());
        let outcome = state.outcomes.pop_front();
        if !state.outcomes.is_empty() {
            self.inner.ready.notify_one();
        }
        drop(state);
        if outcome.is_some() {
            logging::trace_queue!(queue = self.label(), "outcome taken");
        }
        outcome
    }

    /// Moves up to `max_count` Outcomes into `batch`.
    ///
    /// Only the first Outcome is waited for; the rest are taken if they are
    /// already ready. Returns the number appended. A `max_count` of zero returns
    /// zero immediately.
    pub fn try_wait_next_batch(
        &self,
        batch: &mut Vec<Outcome>,
        max_count: usize,
        timeout: impl Into<Option<Timeout>>,
    ) -> usize {
        if max_count == 0 {
            return 0;
        }
        let mut state = self.wait_ready(timeout.into());
        let count = max_count.min(state.outcomes.len());
        batch.extend(state.outcomes.drain(..count));
        if !state.outcomes.is_empty() {
            self.inner.ready.notify_one();
        }
        drop(state);
        if count > 0 {
            logging::trace_queue!(queue = self.label(), count, "outcomes taken");
        }
        count
    }

    /// Blocks until an Outcome is ready or the timeout elapses, returning the
    /// locked state either way.
    fn wait_ready(&self, timeout: Option<Timeout>) -> MutexGuard<'_, QueueState> {
        let mut state = self.lock();
        if !state.outcomes.is_empty() {
            return state;
        }

        let deadline = match timeout.and_then(Timeout::as_duration) {
            Some(wait) if wait.is_zero() => return state,
            Some(wait) => Instant::now().checked_add(wait),
            None => None,
        };

        while state.outcomes.is_empty() {
            match deadline {
                None => {
                    state = self
                        .inner
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    state = self
                        .inner
                        .ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        state
    }

    /// Registers an accepted operation that will deliver here.
    pub(crate) fn begin(&self) {
        self.lock().pending += 1;
    }

    /// Appends a completed Outcome and wakes one waiter.
    pub(crate) fn deliver(&self, outcome: Outcome) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        state.outcomes.push_back(outcome);
        drop(state);
        self.inner.ready.notify_one();
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CompletionQueue")
            .field("name", &self.inner.name)
            .field("ready", &state.outcomes.len())
            .field("pending", &state.pending)
            .finish()
    }
}
