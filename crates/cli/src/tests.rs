use super::*;

use test_support::{patterned_bytes, scratch_dir, write_fixture};

fn run_with(args: &[&std::ffi::OsStr]) -> (i32, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(args.iter().copied(), &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf-8 stdout"),
        String::from_utf8(stderr).expect("utf-8 stderr"),
    )
}

fn os(text: &str) -> &std::ffi::OsStr {
    std::ffi::OsStr::new(text)
}

#[test]
fn help_lists_every_option() {
    let (code, stdout, stderr) = run_with(&[os("aio-copy"), os("--help")]);
    assert_eq!(code, 0);
    assert!(stderr.is_empty());
    for option in ["--flush", "--threads", "--chunk-size", "--max-in-flight", "--debug"] {
        assert!(stdout.contains(option), "help is missing {option}");
    }
}

#[test]
fn version_goes_to_stdout() {
    let (code, stdout, _) = run_with(&[os("aio-copy"), os("-V")]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim_end(), format!("aio-copy {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_option_is_a_usage_error() {
    let (code, stdout, stderr) = run_with(&[os("aio-copy"), os("--bogus"), os("a"), os("b")]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("aio-copy: "), "{stderr}");
    assert!(stderr.contains("--bogus"));
}

#[test]
fn operand_count_is_checked() {
    let (code, _, stderr) = run_with(&[os("aio-copy"), os("only-one")]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("expected SOURCE and DEST operands, got 1"));
}

#[test]
fn bad_chunk_size_is_a_usage_error() {
    let (code, _, stderr) = run_with(&[
        os("aio-copy"),
        os("--chunk-size=12Q"),
        os("a"),
        os("b"),
    ]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("invalid --chunk-size '12Q'"));
}

#[test]
fn zero_in_flight_is_rejected() {
    let (code, _, stderr) = run_with(&[
        os("aio-copy"),
        os("--max-in-flight"),
        os("0"),
        os("a"),
        os("b"),
    ]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("--max-in-flight"));
}

#[test]
fn unknown_debug_flag_is_a_usage_error() {
    let (code, _, stderr) = run_with(&[
        os("aio-copy"),
        os("--debug=wobble"),
        os("a"),
        os("b"),
    ]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("unknown debug flag: wobble"));
}

#[test]
fn parse_args_collects_options() {
    let parsed = parse_args([
        "aio-copy",
        "-vv",
        "--flush",
        "--threads=3",
        "--chunk-size",
        "64K",
        "--max-in-flight=5",
        "--debug=submit2",
        "--debug",
        "close",
        "src",
        "dst",
    ])
    .unwrap();

    assert_eq!(parsed.verbosity, 2);
    assert!(parsed.flush);
    assert_eq!(parsed.threads, Some(3));
    assert_eq!(parsed.chunk_size.as_deref(), Some(os("64K")));
    assert_eq!(parsed.max_in_flight, Some(5));
    assert_eq!(parsed.debug, vec!["submit2".to_owned(), "close".to_owned()]);
    assert_eq!(parsed.operands, vec![OsString::from("src"), OsString::from("dst")]);

    let options = copy_options(&parsed).unwrap();
    assert_eq!(options.chunk_size, 64 * 1024);
    assert_eq!(options.max_in_flight, 5);
    assert!(options.flush);
}

#[test]
fn defaults_apply_without_options() {
    let parsed = parse_args(["aio-copy", "a", "b"]).unwrap();
    assert_eq!(parsed, ParsedArgs {
        operands: vec![OsString::from("a"), OsString::from("b")],
        ..ParsedArgs::default()
    });
    let options = copy_options(&parsed).unwrap();
    assert_eq!(options.chunk_size, copy::DEFAULT_CHUNK_SIZE);
    assert_eq!(options.max_in_flight, copy::DEFAULT_MAX_IN_FLIGHT);
    assert!(!options.flush);
}

#[test]
fn copies_file_and_prints_summary() {
    let dir = scratch_dir();
    let payload = patterned_bytes(50_000);
    let source = write_fixture(dir.path(), "in.bin", &payload).unwrap();
    let destination = dir.path().join("out.bin");

    let (code, stdout, stderr) = run_with(&[
        os("aio-copy"),
        os("--flush"),
        os("--threads=2"),
        os("--chunk-size=16K"),
        source.as_os_str(),
        destination.as_os_str(),
    ]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stderr.is_empty());
    assert!(stdout.starts_with("copied 50000 bytes in 4 chunks ("), "{stdout}");
    assert!(stdout.trim_end().ends_with("s)"));
    assert_eq!(std::fs::read(&destination).unwrap(), payload);
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = scratch_dir();
    let missing = dir.path().join("missing.bin");
    let destination = dir.path().join("out.bin");

    let (code, stdout, stderr) = run_with(&[
        os("aio-copy"),
        missing.as_os_str(),
        destination.as_os_str(),
    ]);
    assert_eq!(code, EXIT_IO);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("aio-copy: failed to open"), "{stderr}");
}

#[test]
fn exit_codes_are_clamped() {
    assert_eq!(exit_code_from(0), std::process::ExitCode::SUCCESS);
    assert_eq!(exit_code_from(-4), std::process::ExitCode::from(0));
    assert_eq!(exit_code_from(2), std::process::ExitCode::from(2));
    assert_eq!(exit_code_from(1_000), std::process::ExitCode::from(255));
}
