#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `aio-copy` command-line front end. It copies one file
//! to another by pipelining chunked reads into writes through the [`aio`]
//! engine, then prints a one-line summary.
//!
//! # Design
//!
//! [`run`] is the entry point. It accepts the argument iterator together with
//! handles for standard output and error, so tests drive it exactly as the
//! binary does. A [`clap`](https://docs.rs/clap/) command definition performs
//! the parse; [`copy::copy_file`] performs the transfer.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as non-zero exit codes.
//! - Diagnostics go to the error handle, prefixed with `aio-copy:`.
//! - Verbosity flags only install a subscriber when they ask for output, so a
//!   plain invocation writes nothing but the summary.
//!
//! # Errors
//!
//! Usage errors return `1`. Failures while opening, transferring or closing
//! return `2`.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["aio-copy", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("aio-copy "));
//! assert!(stderr.is_empty());
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use aio::{Engine, EngineConfig};
use clap::{Arg, ArgAction, Command, builder::OsStringValueParser};
use logging::VerbosityConfig;

pub mod copy;
mod size;

pub use copy::{CopyError, CopyOptions, CopySummary, copy_file};

/// Program name used in banners and diagnostics.
pub const PROGRAM_NAME: &str = "aio-copy";

/// Exit status for bad command lines.
pub const EXIT_USAGE: i32 = 1;

/// Exit status for I/O failures.
pub const EXIT_IO: i32 = 2;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

const HELP_TEXT: &str = concat!(
    "Usage: aio-copy [OPTIONS] SOURCE DEST\n",
    "\n",
    "Copy SOURCE to DEST through the asynchronous file I/O engine.\n",
    "\n",
    "Options:\n",
    "  -v, --verbose          Increase diagnostic output (repeatable).\n",
    "      --debug=FLAGS      Set per-subsystem levels, e.g. submit2,close.\n",
    "      --flush            Flush DEST to storage before reporting success.\n",
    "      --threads=N        Worker threads (0 uses all cores).\n",
    "      --chunk-size=SIZE  Bytes per chunk, with optional K/M/G suffix.\n",
    "      --max-in-flight=N  Reads and writes outstanding at once.\n",
    "  -h, --help             Show this help message and exit.\n",
    "  -V, --version          Output version information and exit.\n",
);

/// Command line after parsing, before validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    /// `-h`/`--help` was given.
    pub show_help: bool,
    /// `-V`/`--version` was given.
    pub show_version: bool,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// `--debug` lists, in order.
    pub debug: Vec<String>,
    /// `--flush` was given.
    pub flush: bool,
    /// `--threads` value.
    pub threads: Option<usize>,
    /// Raw `--chunk-size` value.
    pub chunk_size: Option<OsString>,
    /// `--max-in-flight` value.
    pub max_in_flight: Option<usize>,
    /// Positional operands.
    pub operands: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("FLAGS")
                .action(ArgAction::Append),
        )
        .arg(Arg::new("flush").long("flush").action(ArgAction::SetTrue))
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_name("SIZE")
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("max-in-flight")
                .long("max-in-flight")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("operands")
                .value_name("PATH")
                .num_args(0..)
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Append),
        )
}

/// Parses `arguments` (including the program name) into [`ParsedArgs`].
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let arguments: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    let mut matches = clap_command().try_get_matches_from(arguments)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        verbosity: matches.get_count("verbose"),
        debug: matches
            .remove_many::<String>("debug")
            .map(Iterator::collect)
            .unwrap_or_default(),
        flush: matches.get_flag("flush"),
        threads: matches.remove_one::<usize>("threads"),
        chunk_size: matches.remove_one::<OsString>("chunk-size"),
        max_in_flight: matches.remove_one::<usize>("max-in-flight"),
        operands: matches
            .remove_many::<OsString>("operands")
            .map(Iterator::collect)
            .unwrap_or_default(),
    })
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code: `0` on success, [`EXIT_USAGE`] for bad
/// command lines and [`EXIT_IO`] when the copy fails.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let rendered = error.to_string();
            let text = rendered.trim_end();
            let text = text.strip_prefix("error: ").unwrap_or(text);
            report(stderr, text);
            EXIT_USAGE
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        return if stdout.write_all(HELP_TEXT.as_bytes()).is_ok() {
            0
        } else {
            EXIT_USAGE
        };
    }
    if parsed.show_version {
        return if writeln!(stdout, "{PROGRAM_NAME} {}", env!("CARGO_PKG_VERSION")).is_ok() {
            0
        } else {
            EXIT_USAGE
        };
    }

    let options = match copy_options(&parsed) {
        Ok(options) => options,
        Err(message) => {
            report(stderr, &message);
            return EXIT_USAGE;
        }
    };
    if let Err(message) = install_tracing(parsed.verbosity, &parsed.debug) {
        report(stderr, &message);
        return EXIT_USAGE;
    }

    let mut config = EngineConfig::default().with_thread_name_prefix("aio-copy");
    if let Some(threads) = parsed.threads {
        config = config.with_worker_threads(threads);
    }
    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(error) => {
            report(stderr, &error.to_string());
            return EXIT_IO;
        }
    };

    match copy_file(&engine, &options) {
        Ok(summary) => {
            if writeln!(stdout, "{}", summary.render()).is_err() {
                return EXIT_IO;
            }
            0
        }
        Err(error) => {
            report(stderr, &error.to_string());
            EXIT_IO
        }
    }
}

fn copy_options(parsed: &ParsedArgs) -> Result<CopyOptions, String> {
    let [source, destination] = parsed.operands.as_slice() else {
        return Err(format!(
            "expected SOURCE and DEST operands, got {}; try '{PROGRAM_NAME} --help'",
            parsed.operands.len()
        ));
    };

    let mut options = CopyOptions::new(PathBuf::from(source), PathBuf::from(destination));
    options.flush = parsed.flush;
    if let Some(value) = &parsed.chunk_size {
        options.chunk_size = size::parse_chunk_size(value)?;
    }
    if let Some(limit) = parsed.max_in_flight {
        if limit == 0 {
            return Err("invalid --max-in-flight '0': must be positive".to_owned());
        }
        options.max_in_flight = limit;
    }
    Ok(options)
}

fn install_tracing(verbosity: u8, debug: &[String]) -> Result<(), String> {
    if verbosity == 0 && debug.is_empty() {
        return Ok(());
    }
    let mut config = VerbosityConfig::from_verbose_level(verbosity);
    for list in debug {
        config.apply_debug_list(list)?;
    }
    logging::init_tracing(&config);
    Ok(())
}

fn report<Err: Write>(stderr: &mut Err, message: &str) {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: {message}");
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
}

#[cfg(test)]
mod tests;
