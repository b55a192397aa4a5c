//! crates/logging/src/tracing_macros.rs
//! Convenience macros for engine-specific tracing.
//!
//! These macros wrap the standard tracing macros with the target owned by
//! each [`DebugFlag`](crate::DebugFlag), so call sites never spell targets by hand.

/// Emit a handle open trace.
///
/// # Example
/// ```ignore
/// trace_open!(path = %path.display(), "opened");
/// ```
#[macro_export]
macro_rules! trace_open {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aio::open", $($arg)*);
    };
}

/// Emit a submission trace.
///
/// # Example
/// ```ignore
/// trace_submit!(handle = id, offset, len, "read accepted");
/// ```
#[macro_export]
macro_rules! trace_submit {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aio::submit", $($arg)*);
    };
}

/// Emit a rejected submission trace.
#[macro_export]
macro_rules! trace_reject {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "aio::submit", $($arg)*);
    };
}

/// Emit a completion trace.
///
/// # Example
/// ```ignore
/// trace_complete!(kind = ?kind, transferred, "transfer finished");
/// ```
#[macro_export]
macro_rules! trace_complete {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "aio::complete", $($arg)*);
    };
}

/// Emit a close trace.
#[macro_export]
macro_rules! trace_close {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "aio::close", $($arg)*);
    };
}

/// Emit a queue trace.
#[macro_export]
macro_rules! trace_queue {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "aio::queue", $($arg)*);
    };
}

/// Emit an engine lifecycle trace.
#[macro_export]
macro_rules! trace_engine {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "aio::engine", $($arg)*);
    };
}

/// Emit a warning about resources released by a destructor instead of the caller.
#[macro_export]
macro_rules! warn_implicit_release {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "aio::queue", $($arg)*);
    };
}
