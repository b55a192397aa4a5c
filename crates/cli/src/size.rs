//! Parsing of `--chunk-size` style byte counts.

use std::ffi::OsStr;

/// Failure modes of [`parse_size_spec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SizeParseError {
    #[error("value must not be empty")]
    Empty,
    #[error("size must be non-negative")]
    Negative,
    #[error("expected a size with an optional K/M/G suffix")]
    Invalid,
    #[error("size exceeds the supported range")]
    TooLarge,
    #[error("size must be positive")]
    Zero,
}

/// Parses `--chunk-size` into a positive byte count.
pub(crate) fn parse_chunk_size(value: &OsStr) -> Result<usize, String> {
    let text = value.to_string_lossy();
    let trimmed = text.trim_matches(|ch: char| ch.is_ascii_whitespace());

    parse_size_spec(trimmed)
        .and_then(|size| if size == 0 { Err(SizeParseError::Zero) } else { Ok(size) })
        .and_then(|size| usize::try_from(size).map_err(|_| SizeParseError::TooLarge))
        .map_err(|error| format!("invalid --chunk-size '{trimmed}': {error}"))
}

/// Parses `N`, `NK`, `NM` or `NG` (binary multiples, optional trailing `B`).
fn parse_size_spec(text: &str) -> Result<u64, SizeParseError> {
    if text.is_empty() {
        return Err(SizeParseError::Empty);
    }
    let unsigned = match text.strip_prefix('+') {
        Some(rest) => rest,
        None if text.starts_with('-') => return Err(SizeParseError::Negative),
        None => text,
    };

    let digits_end = unsigned
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_end == 0 {
        return Err(SizeParseError::Invalid);
    }
    let (digits, suffix) = unsigned.split_at(digits_end);

    let shift = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" | "kib" => 10,
        "m" | "mb" | "mib" => 20,
        "g" | "gb" | "gib" => 30,
        _ => return Err(SizeParseError::Invalid),
    };

    let base: u64 = digits.parse().map_err(|_| SizeParseError::TooLarge)?;
    base.checked_mul(1u64 << shift)
        .ok_or(SizeParseError::TooLarge)
}
