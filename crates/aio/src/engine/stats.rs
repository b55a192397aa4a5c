//! Engine-wide counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::outcome::{OutcomeStatus, TaskKind};

/// Snapshot of an engine's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineStats {
    /// Operations accepted, closes included.
    pub submitted: u64,
    /// Outcomes produced, whatever their status.
    pub completed: u64,
    /// Outcomes with [`OutcomeStatus::Cancelled`].
    pub cancelled: u64,
    /// Outcomes with [`OutcomeStatus::Failure`].
    pub failed: u64,
    /// Bytes moved by reads.
    pub bytes_read: u64,
    /// Bytes moved by writes.
    pub bytes_written: u64,
    /// Handles whose close has not executed.
    pub open_handles: usize,
}

impl EngineStats {
    /// Accepted operations whose Outcome has not been produced yet.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_status(&self, status: OutcomeStatus) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        match status {
            OutcomeStatus::Success => {}
            OutcomeStatus::Failure => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            OutcomeStatus::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn record_transfer(&self, kind: TaskKind, status: OutcomeStatus, bytes: usize) {
        self.record_status(status);
        let bytes = bytes as u64;
        match kind {
            TaskKind::Read => self.bytes_read.fetch_add(bytes, Ordering::Relaxed),
            TaskKind::Write | TaskKind::Close => self.bytes_written.fetch_add(bytes, Ordering::Relaxed),
        };
    }

    pub(crate) fn record_close(&self, status: OutcomeStatus) {
        self.record_status(status);
    }

    pub(crate) fn snapshot(&self, open_handles: usize) -> EngineStats {
        EngineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            open_handles,
        }
    }
}
