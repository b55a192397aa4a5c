#![deny(missing_docs)]

//! Shared fixtures for the workspace's tests and benches.
//!
//! Kept free of workspace dependencies so every crate can pull it in as a
//! dev-dependency without cycles.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Creates a scratch directory removed when the returned guard drops.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn scratch_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("aio-test-")
        .tempdir()
        .expect("create scratch directory")
}

/// Writes `contents` to `dir/name` and returns the full path.
pub fn write_fixture(dir: &Path, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

/// Deterministic, non-repeating-looking payload of `len` bytes.
///
/// Offsets are recoverable from content, so a misplaced chunk shows up as a
/// byte mismatch rather than silently matching.
#[must_use]
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let mixed = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 56;
            (mixed as u8) ^ (i as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_round_trips_through_disk() {
        let dir = scratch_dir();
        let path = write_fixture(dir.path(), "nested/file.bin", b"abc").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn patterned_bytes_are_deterministic() {
        assert_eq!(patterned_bytes(64), patterned_bytes(64));
        assert_eq!(patterned_bytes(0).len(), 0);
        assert_ne!(patterned_bytes(512)[..256], patterned_bytes(512)[256..]);
    }
}
