use assert_cmd::Command;
use test_support::{patterned_bytes, scratch_dir, write_fixture};

fn aio_copy() -> Command {
    Command::cargo_bin("aio-copy").expect("aio-copy binary is built")
}

#[test]
fn help_lists_usage() {
    let output = aio_copy().arg("--help").output().unwrap();
    assert!(output.status.success());
    assert!(output.stderr.is_empty());
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage: aio-copy"));
}

#[test]
fn missing_operands_exit_with_usage_status() {
    let output = aio_copy().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("aio-copy: expected SOURCE and DEST"));
}

#[test]
fn copies_and_reports_summary() {
    let dir = scratch_dir();
    let payload = patterned_bytes(300_000);
    let source = write_fixture(dir.path(), "src/data.bin", &payload).unwrap();
    let destination = dir.path().join("copy.bin");

    let output = aio_copy()
        .args(["--flush", "--chunk-size=64K", "--max-in-flight=4"])
        .arg(&source)
        .arg(&destination)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("copied 300000 bytes in 5 chunks"), "{stdout}");
    assert_eq!(std::fs::read(&destination).unwrap(), payload);
}

#[test]
fn unreadable_source_exits_with_io_status() {
    let dir = scratch_dir();
    let output = aio_copy()
        .arg(dir.path().join("absent"))
        .arg(dir.path().join("out"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent"));
}

#[test]
fn verbose_copy_logs_to_stderr() {
    let dir = scratch_dir();
    let source = write_fixture(dir.path(), "v.bin", b"verbose").unwrap();
    let destination = dir.path().join("v.out");

    let output = aio_copy()
        .env_remove("RUST_LOG")
        .arg("-v")
        .arg(&source)
        .arg(&destination)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("aio::engine"), "{stderr}");
    assert_eq!(std::fs::read(&destination).unwrap(), b"verbose");
}
