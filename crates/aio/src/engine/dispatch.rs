//! Submission and execution of handle operations.
//!
//! Each handle carries a small state machine guarded by one mutex:
//! the number of accepted transfers, whether a close has been accepted, and a
//! close parked until the transfer count drops to zero. Workers deliver a
//! transfer's Outcome *before* decrementing that count, so a parked close can
//! only run, and deliver its own Outcome, after every earlier Outcome is
//! already on its queue.

use std::io;
use std::sync::Arc;

use crate::buffer::IoBuffer;
use crate::error::SubmitError;
use crate::handle::HandleCore;
use crate::outcome::{Outcome, OutcomeParts, OutcomeStatus, Tag, TaskKind};
use crate::queue::CompletionQueue;
use crate::sys;

/// Where an operation's Outcome goes.
pub(crate) enum Sink {
    Queue(CompletionQueue),
    /// Released as soon as it is produced; used for detached closes.
    Discard,
}

impl Sink {
    fn begin(&self) {
        if let Self::Queue(queue) = self {
            queue.begin();
        }
    }

    fn deliver(&self, outcome: Outcome) {
        match self {
            Self::Queue(queue) => queue.deliver(outcome),
            Self::Discard => outcome.discard(),
        }
    }
}

/// A read or write waiting for a worker.
pub(crate) struct Transfer {
    kind: TaskKind,
    buffer: IoBuffer,
    offset: u64,
    /// Close the handle on the same worker once the transfer finishes,
    /// flushing when `Some(true)`. Folds the close result into the transfer's
    /// Outcome instead of producing a separate one.
    close_after: Option<bool>,
}

impl Transfer {
    pub(crate) const fn new(kind: TaskKind, buffer: IoBuffer, offset: u64) -> Self {
        Self {
            kind,
            buffer,
            offset,
            close_after: None,
        }
    }

    pub(crate) const fn then_close(mut self, flush: bool) -> Self {
        self.close_after = Some(flush);
        self
    }
}

/// A close waiting to run.
pub(crate) struct CloseRequest {
    flush: bool,
    sink: Sink,
    tag: Tag,
}

impl CloseRequest {
    pub(crate) const fn new(flush: bool, sink: Sink, tag: Tag) -> Self {
        Self { flush, sink, tag }
    }
}

/// Accepts a read or write and hands it to the worker pool.
pub(crate) fn submit_transfer(
    core: &Arc<HandleCore>,
    transfer: Transfer,
    sink: Sink,
    tag: Tag,
) -> Result<(), SubmitError> {
    let engine = &core.engine;
    {
        let mut state = core.lock_state();
        if state.closing {
            return Err(SubmitError::InvalidHandle);
        }
        if engine.is_shut_down() {
            return Err(SubmitError::ShuttingDown);
        }
        engine.reserve_slot()?;
        state.pending += 1;
        if transfer.close_after.is_some() {
            state.closing = true;
        }
    }

    sink.begin();
    engine.stats.record_submitted();
    logging::trace_submit!(
        handle = %core.id,
        kind = %transfer.kind,
        offset = transfer.offset,
        len = transfer.buffer.len(),
        "accepted"
    );

    let core = Arc::clone(core);
    engine
        .workers
        .spawn(move || run_transfer(&core, transfer, &sink, tag));
    Ok(())
}

/// Accepts a close, running it now or once the handle's transfers drain.
pub(crate) fn submit_close(core: &Arc<HandleCore>, request: CloseRequest) -> Result<(), SubmitError> {
    let run_now = {
        let mut state = core.lock_state();
        if state.closing {
            return Err(SubmitError::InvalidHandle);
        }
        state.closing = true;
        request.sink.begin();
        core.engine.stats.record_submitted();
        if state.pending == 0 {
            Some(request)
        } else {
            logging::trace_close!(
                handle = %core.id,
                pending = state.pending,
                "close deferred until pending operations complete"
            );
            state.deferred_close = Some(request);
            None
        }
    };

    if let Some(request) = run_now {
        let worker_core = Arc::clone(core);
        core.engine
            .workers
            .spawn(move || run_close(&worker_core, request));
    }
    Ok(())
}

fn run_transfer(core: &Arc<HandleCore>, transfer: Transfer, sink: &Sink, tag: Tag) {
    let engine = &core.engine;
    let Transfer {
        kind,
        mut buffer,
        offset,
        close_after,
    } = transfer;
    let requested = buffer.len();

    let (mut status, transferred, mut error) = if engine.is_shut_down() {
        (OutcomeStatus::Cancelled, 0, None)
    } else {
        let (transferred, error) = execute(core, kind, &mut buffer, offset);
        let status = if error.is_some() {
            OutcomeStatus::Failure
        } else {
            OutcomeStatus::Success
        };
        (status, transferred, error)
    };

    if let Some(flush) = close_after {
        if let Err(close_error) = close_file(core, flush) {
            if status == OutcomeStatus::Success {
                status = OutcomeStatus::Failure;
            }
            error.get_or_insert(close_error);
        }
    }

    engine.stats.record_transfer(kind, status, transferred);
    logging::trace_complete!(
        handle = %core.id,
        %kind,
        status = ?status,
        requested,
        transferred,
        offset,
        "transfer finished"
    );

    let pool = buffer.is_pooled().then(|| Arc::clone(&engine.buffers));
    let outcome = Outcome::from_parts(OutcomeParts {
        kind,
        status,
        error,
        handle_id: core.id,
        handle: core.guard.clone(),
        buffer: Some(buffer),
        requested,
        transferred,
        offset,
        tag,
        pool,
    });

    engine.release_slot();
    sink.deliver(outcome);
    finish_transfer(core);
}

fn execute(
    core: &HandleCore,
    kind: TaskKind,
    buffer: &mut IoBuffer,
    offset: u64,
) -> (usize, Option<io::Error>) {
    let Some(file) = core.file() else {
        return (0, Some(io::Error::other("handle is closed")));
    };
    match kind {
        TaskKind::Read => match buffer.as_mut_slice() {
            Some(destination) => sys::read_full_at(&file, destination, offset),
            None => (
                0,
                Some(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "cannot read into a shared buffer",
                )),
            ),
        },
        TaskKind::Write | TaskKind::Close => sys::write_full_at(&file, buffer.as_slice(), offset),
    }
}

/// Drops one pending transfer and runs the parked close if it was the last.
fn finish_transfer(core: &Arc<HandleCore>) {
    let deferred = {
        let mut state = core.lock_state();
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            state.deferred_close.take()
        } else {
            None
        }
    };
    if let Some(request) = deferred {
        run_close(core, request);
    }
}

fn run_close(core: &Arc<HandleCore>, request: CloseRequest) {
    let CloseRequest { flush, sink, tag } = request;
    let (status, error) = match close_file(core, flush) {
        Ok(()) => (OutcomeStatus::Success, None),
        Err(error) => (OutcomeStatus::Failure, Some(error)),
    };

    core.engine.stats.record_close(status);
    logging::trace_close!(handle = %core.id, flush, status = ?status, "closed");

    let outcome = Outcome::from_parts(OutcomeParts {
        kind: TaskKind::Close,
        status,
        error,
        handle_id: core.id,
        handle: core.guard.clone(),
        buffer: None,
        requested: 0,
        transferred: 0,
        offset: 0,
        tag,
        pool: None,
    });
    sink.deliver(outcome);
}

/// Releases the file, syncing it to storage first when `flush` is set.
///
/// The handle leaves the registry even when the sync fails; the file is not
/// recoverable at that point.
fn close_file(core: &HandleCore, flush: bool) -> io::Result<()> {
    let file = core.take_file();
    core.engine.registry.remove(core.id);
    core.lock_state().closed = true;

    let Some(file) = file else {
        return Ok(());
    };
    let synced = if flush { file.sync_all() } else { Ok(()) };
    drop(file);
    synced
}
