#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the diagnostic vocabulary of the workspace. The engine crate
//! emits `tracing` events through the subsystem macros defined here
//! ([`trace_submit!`], [`trace_close!`], ...), each bound to one target under
//! the `aio::` prefix. Binaries turn a `-v` count or a `--debug` flag list into
//! a [`VerbosityConfig`] and install a subscriber with [`init_tracing`].
//!
//! # Design
//!
//! - [`DebugFlag`] enumerates the subsystems and their targets.
//! - [`VerbosityConfig`] stores a level per flag and renders it as
//!   `EnvFilter` directives, so the mapping from verbosity to output lives in
//!   one place.
//! - `RUST_LOG` always wins over the verbosity-derived filter.
//!
//! # Examples
//!
//! ```
//! use logging::{DebugFlag, VerbosityConfig};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flag("submit2").unwrap();
//!
//! assert_eq!(config.debug.get(DebugFlag::Submit), 2);
//! assert!(config.directives().contains("aio::submit=debug"));
//! ```

mod config;
mod levels;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DebugFlag, DebugLevels};
pub use tracing_bridge::{LOG_ENV_VAR, init_tracing, init_tracing_with_filter};
