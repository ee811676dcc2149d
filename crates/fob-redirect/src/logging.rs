//! Subscriber setup for hosts that run fob-redirect standalone.
//!
//! Requires the `logging` feature. The level applies to the `fob_redirect`
//! target only; other crates stay at `warn`, so `LogLevel::Debug` shows
//! each rewritten specifier without the host's own debug output.
//! `RUST_LOG` directives are appended and win over the defaults.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Target of every event this crate emits.
pub const TARGET: &str = "fob_redirect";

static INIT: Once = Once::new();

/// Log level for redirect output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// No logging output
    Silent,
    /// Only errors, e.g. modules that failed to parse
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and info (default)
    #[default]
    Info,
    /// Every rewritten specifier
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Level for targets outside this crate.
    fn host_filter(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            _ => "warn",
        }
    }
}

/// Filter directives for `level`, followed by `env` (usually `RUST_LOG`).
pub fn filter_directives(level: LogLevel, env: Option<&str>) -> String {
    let mut directives = format!("{},{}={}", level.host_filter(), TARGET, level.as_filter());
    if let Some(env) = env.map(str::trim).filter(|e| !e.is_empty()) {
        directives.push(',');
        directives.push_str(env);
    }
    directives
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter())
    }
}

/// Initialize logging with the given default level.
///
/// `RUST_LOG` directives still apply on top of `level`. Only the first call
/// in a process installs the subscriber, and an already installed global
/// subscriber is left in place.
///
/// # Example
///
/// ```rust,no_run
/// use fob_redirect::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = EnvFilter::new(filter_directives(level, env.as_deref()));

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).without_time())
            .try_init();
        if installed.is_err() {
            tracing::debug!("Global subscriber already set");
        }
    });
}

/// Initialize logging from RUST_LOG, falling back to Info.
pub fn init_logging_from_env() {
    init_logging(LogLevel::Info);
}
