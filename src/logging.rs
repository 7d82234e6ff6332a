//! Logging setup backed by `tracing-subscriber`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_ENV_VAR: &str = "WARDEN_LOG";

/// Map a `-v` count to a base level.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber writing to stderr.
///
/// `WARDEN_LOG` takes precedence over `verbosity` when set.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .map_err(|e| anyhow::anyhow!("Invalid {LOG_ENV_VAR} filter '{directives}': {e}"))?,
        _ => EnvFilter::new(format!("warden={}", level_for_verbosity(verbosity))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}
