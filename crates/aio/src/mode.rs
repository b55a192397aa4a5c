//! Open mode strings accepted by [`Engine::open`](crate::Engine::open).
//!
//! The set is a restricted `fopen` vocabulary: no append mode (every transfer
//! names its offset) and no text/binary suffix (all I/O is binary).

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::error::ModeError;

/// Access and creation policy for an opened file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// `"r"`: read an existing file.
    Read,
    /// `"w"`: write, creating the file or truncating it.
    Write,
    /// `"wx"`: write, creating the file; fails if it exists.
    WriteExclusive,
    /// `"r+"`: read and write an existing file.
    ReadWrite,
    /// `"w+"`: read and write, creating the file or truncating it.
    ReadWriteTruncate,
    /// `"w+x"`: read and write, creating the file; fails if it exists.
    ReadWriteExclusive,
}

impl OpenMode {
    /// Every supported mode.
    pub const ALL: [Self; 6] = [
        Self::Read,
        Self::Write,
        Self::WriteExclusive,
        Self::ReadWrite,
        Self::ReadWriteTruncate,
        Self::ReadWriteExclusive,
    ];

    /// Parses a mode string.
    pub fn parse(mode: &str) -> Result<Self, ModeError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == mode)
            .ok_or_else(|| ModeError::Unsupported(mode.to_owned()))
    }

    /// Returns the canonical mode string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::WriteExclusive => "wx",
            Self::ReadWrite => "r+",
            Self::ReadWriteTruncate => "w+",
            Self::ReadWriteExclusive => "w+x",
        }
    }

    /// Whether reads may be submitted against a handle opened with this mode.
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(
            self,
            Self::Read | Self::ReadWrite | Self::ReadWriteTruncate | Self::ReadWriteExclusive
        )
    }

    /// Whether writes may be submitted against a handle opened with this mode.
    #[must_use]
    pub const fn writable(self) -> bool {
        !matches!(self, Self::Read)
    }

    /// Translates the mode into [`OpenOptions`].
    #[must_use]
    pub fn to_open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.readable()).write(self.writable());
        match self {
            Self::Read | Self::ReadWrite => {}
            Self::Write | Self::ReadWriteTruncate => {
                options.create(true).truncate(true);
            }
            Self::WriteExclusive | Self::ReadWriteExclusive => {
                options.create_new(true);
            }
        }
        options
    }
}

impl FromStr for OpenMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
