//! Whole-file loads and saves.
//!
//! Both forms open the file, submit one transfer covering the whole file and
//! close it on the worker once the transfer is done. The caller never sees a
//! handle, only the single Outcome.

use std::io;
use std::path::Path;

use crate::buffer::IoBuffer;
use crate::engine::Engine;
use crate::engine::dispatch::{self, Sink, Transfer};
use crate::error::{AioError, SubmitError};
use crate::last_error;
use crate::mode::OpenMode;
use crate::outcome::{Tag, TaskKind};
use crate::queue::CompletionQueue;

fn reject(error: SubmitError) -> SubmitError {
    last_error::record(&error);
    logging::trace_reject!(%error, "whole-file submission rejected");
    error
}

impl Engine {
    /// Reads all of `path` into an engine-allocated buffer.
    ///
    /// Exactly one [`TaskKind::Read`] Outcome reaches `queue`; it owns the
    /// buffer, so releasing it is the only way to free the data. Open failures
    /// are reported synchronously as [`SubmitError::Open`].
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        let path = path.as_ref();
        let handle = self.open(path, OpenMode::Read)?;
        let len = handle
            .try_size()
            .and_then(|len| {
                usize::try_from(len).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidData, "file too large to load")
                })
            })
            .map_err(|error| reject(AioError::open(path, error).into()))?;

        let buffer = IoBuffer::pooled(self.buffer_pool().acquire(len));
        let transfer = Transfer::new(TaskKind::Read, buffer, 0).then_close(false);
        dispatch::submit_transfer(handle.core(), transfer, Sink::Queue(queue.clone()), tag)
            .map_err(reject)
    }

    /// Replaces the contents of `path` with `data`.
    ///
    /// Exactly one [`TaskKind::Write`] Outcome reaches `queue`. Its status is
    /// `Failure` when either the write or the close (including the sync when
    /// `flush` is set) failed.
    pub fn save_file(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<IoBuffer>,
        flush: bool,
        queue: &CompletionQueue,
        tag: Tag,
    ) -> Result<(), SubmitError> {
        let handle = self.open(path, OpenMode::Write)?;
        let transfer = Transfer::new(TaskKind::Write, data.into(), 0).then_close(flush);
        dispatch::submit_transfer(handle.core(), transfer, Sink::Queue(queue.clone()), tag)
            .map_err(reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    use crate::engine::EngineConfig;
    use crate::outcome::OutcomeStatus;
    use crate::queue::Timeout;

    fn engine() -> Engine {
        Engine::new(EngineConfig::single_threaded()).unwrap()
    }

    #[test]
    fn load_delivers_single_outcome_with_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, b"whole file contents").unwrap();

        let engine = engine();
        let queue = CompletionQueue::new();
        engine.load_file(&path, &queue, Tag::Value(11)).unwrap();

        let mut outcome = queue.try_wait_next(Timeout::INFINITE).unwrap();
        assert_eq!(outcome.kind(), TaskKind::Read);
        assert_eq!(outcome.status(), OutcomeStatus::Success);
        assert_eq!(outcome.buffer(), b"whole file contents");
        assert_eq!(outcome.tag().value(), Some(11));
        outcome.release();

        assert!(queue.try_wait_next(Timeout::from_millis(20).unwrap()).is_none());
        assert_eq!(engine.stats().open_handles, 0);
    }

    #[test]
    fn load_of_empty_file_yields_empty_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let engine = engine();
        let queue = CompletionQueue::new();
        engine.load_file(&path, &queue, Tag::None).unwrap();

        let mut outcome = queue.try_wait_next(Timeout::INFINITE).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.transferred(), 0);
        assert!(outcome.buffer().is_empty());
        outcome.release();
    }

    #[test]
    fn load_of_missing_file_fails_synchronously() {
        let dir = tempdir().unwrap();
        let engine = engine();
        let queue = CompletionQueue::new();
        last_error::clear_last_error();

        let err = engine
            .load_file(dir.path().join("absent"), &queue, Tag::None)
            .unwrap_err();
        assert!(matches!(err, SubmitError::Open(AioError::Open { .. })));
        assert!(last_error::last_error().is_some());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn save_writes_and_reports_one_outcome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let engine = engine();
        let queue = CompletionQueue::new();
        engine
            .save_file(&path, b"saved bytes".to_vec(), true, &queue, Tag::None)
            .unwrap();

        let mut outcome = queue.try_wait_next(Timeout::INFINITE).unwrap();
        assert_eq!(outcome.kind(), TaskKind::Write);
        assert!(outcome.is_success());
        assert_eq!(outcome.transferred(), 11);
        outcome.release();

        assert!(queue.try_wait_next(Timeout::from_millis(20).unwrap()).is_none());
        assert_eq!(std::fs::read(&path).unwrap(), b"saved bytes");
    }

    #[test]
    fn save_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"a much longer previous body").unwrap();

        let engine = engine();
        let queue = CompletionQueue::new();
        engine
            .save_file(&path, &b"short"[..], false, &queue, Tag::None)
            .unwrap();
        queue.try_wait_next(Timeout::INFINITE).unwrap().release();

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }
}
