//! Positional file I/O used by the worker threads.
//!
//! Reads and writes never touch the shared file cursor, so concurrent
//! transfers against one handle do not interfere with each other.

use std::fs::File;
use std::io;

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(unix)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.write_at(buf, offset)
}

#[cfg(windows)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_write(buf, offset)
}

/// Reads into `buf` at `offset` until it is full or end of file is reached.
///
/// Returns the byte count and, when the loop stopped on an error, that error.
/// The count is valid in both cases.
pub(crate) fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> (usize, Option<io::Error>) {
    let mut done = 0usize;
    while done < buf.len() {
        match pread(file, &mut buf[done..], offset + done as u64) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (done, Some(e)),
        }
    }
    (done, None)
}

/// Writes all of `buf` at `offset`.
///
/// Returns the byte count written before any error.
pub(crate) fn write_full_at(file: &File, buf: &[u8], offset: u64) -> (usize, Option<io::Error>) {
    let mut done = 0usize;
    while done < buf.len() {
        match pwrite(file, &buf[done..], offset + done as u64) {
            Ok(0) => {
                return (
                    done,
                    Some(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )),
                );
            }
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (done, Some(e)),
        }
    }
    (done, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::OpenOptions;

    use tempfile::tempdir;

    #[test]
    fn read_stops_at_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, b"hello").unwrap();
        let file = File::open(&path).unwrap();

        let mut buf = [0u8; 16];
        let (n, err) = read_full_at(&file, &mut buf, 1);
        assert!(err.is_none());
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], b"ello");
    }

    #[test]
    fn read_past_eof_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, b"abc").unwrap();
        let file = File::open(&path).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(read_full_at(&file, &mut buf, 100).0, 0);
    }

    #[test]
    fn write_at_offset_extends_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sparse.bin");
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();

        let (n, err) = write_full_at(&file, b"tail", 6);
        assert!(err.is_none());
        assert_eq!(n, 4);
        assert_eq!(std::fs::read(&path).unwrap(), b"\0\0\0\0\0\0tail");
    }

    #[test]
    fn write_to_read_only_file_reports_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.bin");
        std::fs::write(&path, b"x").unwrap();
        let file = File::open(&path).unwrap();

        let (n, err) = write_full_at(&file, b"data", 0);
        assert_eq!(n, 0);
        assert!(err.is_some());
    }
}
