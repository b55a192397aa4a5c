//! crates/logging/src/config.rs
//! Verbosity configuration and its translation into tracing filter directives.

use tracing_subscriber::EnvFilter;

use super::levels::{DebugFlag, DebugLevels};

/// Per-subsystem verbosity for the engine.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a new configuration from a verbose level (number of `-v` flags).
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.debug.open = 1;
                config.debug.close = 1;
                config.debug.engine = 1;
            }
            2 => {
                config.debug.open = 2;
                config.debug.close = 2;
                config.debug.engine = 2;
                config.debug.submit = 1;
                config.debug.complete = 1;
                config.debug.queue = 1;
            }
            3 => {
                config.debug.set_all(2);
                config.debug.complete = 3;
            }
            _ => config.debug.set_all(3),
        }

        config
    }

    /// Apply a single debug flag token (e.g., "submit2", "queue").
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        if name == "all" {
            self.debug.set_all(level);
            return Ok(());
        }

        let flag =
            DebugFlag::from_name(name).ok_or_else(|| format!("unknown debug flag: {name}"))?;
        self.debug.set(flag, level);
        Ok(())
    }

    /// Apply a comma-separated list of debug flag tokens.
    pub fn apply_debug_list(&mut self, list: &str) -> Result<(), String> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .try_for_each(|token| self.apply_debug_flag(token))
    }

    /// Renders the configuration as `EnvFilter` directives.
    ///
    /// Everything defaults to `warn`; each flag with a non-zero level adds a
    /// directive for its target.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut directives = String::from("warn");
        for flag in DebugFlag::ALL {
            if let Some(level) = level_name(self.debug.get(flag)) {
                directives.push(',');
                directives.push_str(flag.target());
                directives.push('=');
                directives.push_str(level);
            }
        }
        directives
    }

    /// Builds an [`EnvFilter`] from [`directives`](Self::directives).
    #[must_use]
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::new(self.directives())
    }
}

const fn level_name(level: u8) -> Option<&'static str> {
    match level {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Parse a flag token like "submit2" into ("submit", 2) or "queue" into ("queue", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_string());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((&token[..pos], level))
        }
        None => Ok((token, 1)),
    }
}
