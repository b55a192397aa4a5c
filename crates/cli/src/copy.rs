//! Chunked file copy driven through one completion queue.
//!
//! Reads are issued into engine-allocated buffers and each completed read is
//! resubmitted as a write at the same offset, so a chunk's buffer travels
//! from the read Outcome into the write and back to the pool on release.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use aio::{
    AioError, CompletionQueue, Engine, FileHandle, IoBuffer, OpenMode, Outcome, SubmitError, Tag,
    TaskKind, Timeout,
};
use tracing::debug;

/// Default size of each read/write chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default number of chunks kept in flight.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// What to copy and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyOptions {
    /// File to read.
    pub source: PathBuf,
    /// File to create or truncate.
    pub destination: PathBuf,
    /// Bytes per chunk.
    pub chunk_size: usize,
    /// Reads plus writes outstanding at once.
    pub max_in_flight: usize,
    /// Flush the destination to storage before reporting success.
    pub flush: bool,
}

impl CopyOptions {
    /// Options with the default chunking for `source` to `destination`.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            flush: false,
        }
    }
}

/// Totals reported after a successful copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopySummary {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Completed write chunks.
    pub chunks: u64,
    /// Wall-clock time from open to the last close.
    pub elapsed: Duration,
}

impl CopySummary {
    /// One-line human summary.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "copied {} bytes in {} chunks ({:.3}s)",
            self.bytes,
            self.chunks,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Failures of [`copy_file`].
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Opening either file failed.
    #[error(transparent)]
    Open(#[from] AioError),
    /// The engine refused a submission.
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
    /// The size of the source could not be determined.
    #[error("cannot stat {}: {source}", path.display())]
    Size {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A read or write chunk failed.
    #[error("{kind} of {} at offset {offset} failed: {source}", path.display())]
    Transfer {
        /// Read or write.
        kind: TaskKind,
        /// File the chunk belongs to.
        path: PathBuf,
        /// Chunk offset.
        offset: u64,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The source ended before its reported size.
    #[error("{} shrank during the copy: no data at offset {offset}", path.display())]
    Truncated {
        /// Source path.
        path: PathBuf,
        /// First missing offset.
        offset: u64,
    },
    /// Closing either file failed.
    #[error("closing {} failed: {source}", path.display())]
    Close {
        /// File whose close failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Copies `options.source` to `options.destination` through `engine`.
pub fn copy_file(engine: &Engine, options: &CopyOptions) -> Result<CopySummary, CopyError> {
    let started = Instant::now();
    let source = engine.open(&options.source, OpenMode::Read)?;
    let length = source.try_size().map_err(|source_error| CopyError::Size {
        path: options.source.clone(),
        source: source_error,
    })?;
    let destination = engine.open(&options.destination, OpenMode::Write)?;
    let queue = CompletionQueue::named("aio-copy");

    let mut pipeline = Pipeline {
        source: &source,
        destination: &destination,
        queue: &queue,
        length,
        chunk_size: options.chunk_size.max(1),
        max_in_flight: options.max_in_flight.max(1),
        next_offset: 0,
        in_flight: 0,
        bytes: 0,
        chunks: 0,
    };
    pipeline.run()?;
    let (bytes, chunks) = (pipeline.bytes, pipeline.chunks);

    source.submit_close(false, &queue, Tag::None)?;
    destination.submit_close(options.flush, &queue, Tag::None)?;
    for _ in 0..2 {
        let mut outcome = next_outcome(&queue);
        if let Some(error) = outcome.take_error() {
            let path = if outcome.handle_id() == source.id() {
                options.source.clone()
            } else {
                options.destination.clone()
            };
            return Err(CopyError::Close {
                path,
                source: error,
            });
        }
        outcome.release();
    }

    let summary = CopySummary {
        bytes,
        chunks,
        elapsed: started.elapsed(),
    };
    debug!(bytes, chunks, flush = options.flush, "copy finished");
    Ok(summary)
}

fn next_outcome(queue: &CompletionQueue) -> Outcome {
    loop {
        if let Some(outcome) = queue.try_wait_next(Timeout::INFINITE) {
            return outcome;
        }
    }
}

struct Pipeline<'a> {
    source: &'a FileHandle,
    destination: &'a FileHandle,
    queue: &'a CompletionQueue,
    length: u64,
    chunk_size: usize,
    max_in_flight: usize,
    next_offset: u64,
    in_flight: usize,
    bytes: u64,
    chunks: u64,
}

impl Pipeline<'_> {
    fn run(&mut self) -> Result<(), CopyError> {
        loop {
            self.fill()?;
            if self.in_flight == 0 {
                return Ok(());
            }
            let outcome = next_outcome(self.queue);
            self.in_flight -= 1;
            match outcome.kind() {
                TaskKind::Read => self.forward(outcome)?,
                TaskKind::Write => self.account(outcome)?,
                TaskKind::Close => {}
            }
        }
    }

    fn fill(&mut self) -> Result<(), CopyError> {
        while self.in_flight < self.max_in_flight && self.next_offset < self.length {
            let remaining = self.length - self.next_offset;
            let len = usize::try_from(remaining).map_or(self.chunk_size, |r| r.min(self.chunk_size));
            self.read(len, self.next_offset)?;
            self.next_offset += len as u64;
        }
        Ok(())
    }

    fn read(&mut self, len: usize, offset: u64) -> Result<(), CopyError> {
        self.source
            .submit_read_alloc(len, offset, self.queue, Tag::Value(offset))?;
        self.in_flight += 1;
        Ok(())
    }

    fn forward(&mut self, mut outcome: Outcome) -> Result<(), CopyError> {
        let offset = outcome.offset();
        if let Some(error) = outcome.take_error() {
            return Err(CopyError::Transfer {
                kind: TaskKind::Read,
                path: self.source.path().to_path_buf(),
                offset,
                source: error,
            });
        }

        let requested = outcome.requested();
        let transferred = outcome.transferred();
        if transferred == 0 {
            return Err(CopyError::Truncated {
                path: self.source.path().to_path_buf(),
                offset,
            });
        }

        let buffer = match outcome.into_buffer() {
            Some(buffer) if buffer.len() == transferred => buffer,
            Some(buffer) => {
                let mut bytes = buffer.into_vec();
                bytes.truncate(transferred);
                IoBuffer::Owned(bytes)
            }
            None => IoBuffer::Owned(Vec::new()),
        };
        self.destination
            .submit_write(buffer, offset, self.queue, Tag::Value(offset))?;
        self.in_flight += 1;

        if transferred < requested {
            self.read(requested - transferred, offset + transferred as u64)?;
        }
        Ok(())
    }

    fn account(&mut self, mut outcome: Outcome) -> Result<(), CopyError> {
        let offset = outcome.offset();
        let short = outcome.transferred() < outcome.requested();
        if let Some(error) = outcome.take_error() {
            return Err(self.write_failure(offset, error));
        }
        if short {
            return Err(self.write_failure(offset, io::ErrorKind::WriteZero.into()));
        }
        self.bytes += outcome.transferred() as u64;
        self.chunks += 1;
        outcome.release();
        Ok(())
    }

    fn write_failure(&self, offset: u64, source: io::Error) -> CopyError {
        CopyError::Transfer {
            kind: TaskKind::Write,
            path: self.destination.path().to_path_buf(),
            offset,
            source,
        }
    }
}
