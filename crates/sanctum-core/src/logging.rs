//! Mode-gated tracing setup.
//!
//! Debug and info lines only surface in development; warnings and errors
//! always emit. `RUST_LOG` overrides the mode-derived default.

use tracing_subscriber::EnvFilter;

/// Runtime mode controlling default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

impl RuntimeMode {
    /// Determine the mode from `SANCTUM_MODE`.
    ///
    /// `development` and `dev` select development; anything else (including
    /// an unset variable) is production.
    pub fn from_env() -> Self {
        match std::env::var("SANCTUM_MODE").as_deref() {
            Ok("development" | "dev") => Self::Development,
            _ => Self::Production,
        }
    }

    const fn default_directive(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "warn",
        }
    }
}

/// Install the global tracing subscriber for the given mode.
///
/// Returns an error when a subscriber is already installed.
pub fn init(mode: RuntimeMode) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.default_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Install the global subscriber using the mode from the environment.
pub fn init_from_env() -> anyhow::Result<()> {
    init(RuntimeMode::from_env())
}

/// Highest-severity log line; always emitted regardless of mode.
///
/// tracing has no level above ERROR, so criticals are error events carrying
/// a `critical = true` field that downstream collectors can alert on.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {
        ::tracing::error!(critical = true, $($arg)*)
    };
}
