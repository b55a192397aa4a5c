//! crates/logging/src/tracing_bridge.rs
//! Subscriber installation for binaries and tests.
//!
//! Library crates only emit events; the process that owns `main` decides where
//! they go by calling [`init_tracing`] once.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::config::VerbosityConfig;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Install a stderr subscriber filtered by `config`.
///
/// When `RUST_LOG` is set and parses, it takes precedence over `config`.
/// Returns `false` if a global subscriber was already installed, which makes
/// repeated calls from tests harmless.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(&VerbosityConfig::from_verbose_level(2));
/// tracing::debug!(target: "aio::close", "close deferred");
/// ```
pub fn init_tracing(config: &VerbosityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| config.to_env_filter());
    init_tracing_with_filter(filter)
}

/// Install a stderr subscriber with an explicit filter.
pub fn init_tracing_with_filter(filter: EnvFilter) -> bool {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}
