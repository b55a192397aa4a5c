//! crates/logging/src/levels.rs
//! Debug flag enum and the per-flag level table.

use std::fmt;

/// Engine subsystems that emit diagnostics.
///
/// Each flag owns one tracing target under the `aio::` prefix so filters can
/// raise or silence a single subsystem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DebugFlag {
    /// Handle open and size queries.
    Open,
    /// Accepted and rejected submissions.
    Submit,
    /// Transfer completions produced by worker threads.
    Complete,
    /// Close scheduling, deferral and execution.
    Close,
    /// Queue waits, deliveries and Outcome release.
    Queue,
    /// Engine construction, shutdown and worker pool events.
    Engine,
}

impl DebugFlag {
    /// Every flag, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Open,
        Self::Submit,
        Self::Complete,
        Self::Close,
        Self::Queue,
        Self::Engine,
    ];

    /// Returns the short name accepted by `--debug` flag lists.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Submit => "submit",
            Self::Complete => "complete",
            Self::Close => "close",
            Self::Queue => "queue",
            Self::Engine => "engine",
        }
    }

    /// Returns the tracing target used by events of this subsystem.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Open => "aio::open",
            Self::Submit => "aio::submit",
            Self::Complete => "aio::complete",
            Self::Close => "aio::close",
            Self::Queue => "aio::queue",
            Self::Engine => "aio::engine",
        }
    }

    /// Parses a short flag name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    /// Maps a tracing target back to its flag.
    ///
    /// Matches on the `::name` segment so unrelated targets such as
    /// `"unknown"` never alias a flag.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        Self::from_name(target.rsplit("::").next()?)
    }
}

impl fmt::Display for DebugFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Debug verbosity levels for each flag.
///
/// Level 0 silences the subsystem below warnings, 1 enables `info`,
/// 2 enables `debug` and 3 or more enables `trace`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugLevels {
    /// Handle open level.
    pub open: u8,
    /// Submission level.
    pub submit: u8,
    /// Completion level.
    pub complete: u8,
    /// Close level.
    pub close: u8,
    /// Queue level.
    pub queue: u8,
    /// Engine level.
    pub engine: u8,
}

impl DebugLevels {
    /// Get the level for a specific flag.
    pub fn get(&self, flag: DebugFlag) -> u8 {
        match flag {
            DebugFlag::Open => self.open,
            DebugFlag::Submit => self.submit,
            DebugFlag::Complete => self.complete,
            DebugFlag::Close => self.close,
            DebugFlag::Queue => self.queue,
            DebugFlag::Engine => self.engine,
        }
    }

    /// Set the level for a specific flag.
    pub fn set(&mut self, flag: DebugFlag, level: u8) {
        match flag {
            DebugFlag::Open => self.open = level,
            DebugFlag::Submit => self.submit = level,
            DebugFlag::Complete => self.complete = level,
            DebugFlag::Close => self.close = level,
            DebugFlag::Queue => self.queue = level,
            DebugFlag::Engine => self.engine = level,
        }
    }

    /// Set all flags to the specified level.
    pub fn set_all(&mut self, level: u8) {
        for flag in DebugFlag::ALL {
            self.set(flag, level);
        }
    }
}
