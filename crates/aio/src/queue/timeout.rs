use std::time::Duration;

use crate::error::TimeoutError;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// How long a queue wait may block.
///
/// Nanoseconds are the canonical unit. Conversions reject negative values and
/// anything beyond `i64::MAX` nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timeout {
    nanos: Option<u64>,
}

impl Timeout {
    /// Wait until an Outcome arrives.
    pub const INFINITE: Self = Self { nanos: None };

    /// Never block.
    pub const ZERO: Self = Self { nanos: Some(0) };

    /// A timeout of `nanos` nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Result<Self, TimeoutError> {
        if nanos < 0 {
            return Err(TimeoutError::Negative);
        }
        Ok(Self {
            nanos: Some(nanos.unsigned_abs()),
        })
    }

    /// A timeout of `millis` milliseconds.
    pub const fn from_millis(millis: i64) -> Result<Self, TimeoutError> {
        if millis < 0 {
            return Err(TimeoutError::Negative);
        }
        match millis.checked_mul(NANOS_PER_MILLI) {
            Some(nanos) => Self::from_nanos(nanos),
            None => Err(TimeoutError::Overflow),
        }
    }

    /// Nanoseconds, or `None` for [`Timeout::INFINITE`].
    #[must_use]
    pub const fn as_nanos(self) -> Option<u64> {
        self.nanos
    }

    /// The timeout as a [`Duration`], or `None` for [`Timeout::INFINITE`].
    #[must_use]
    pub const fn as_duration(self) -> Option<Duration> {
        match self.nanos {
            Some(nanos) => Some(Duration::from_nanos(nanos)),
            None => None,
        }
    }

    /// Whether a wait with this timeout never blocks.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        matches!(self.nanos, Some(0))
    }

    /// Whether this is [`Timeout::INFINITE`].
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        self.nanos.is_none()
    }
}

impl TryFrom<Duration> for Timeout {
    type Error = TimeoutError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        let nanos = i64::try_from(duration.as_nanos()).map_err(|_| TimeoutError::Overflow)?;
        Self::from_nanos(nanos)
    }
}
