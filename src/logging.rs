//! Explicit tracing setup. The library only emits events; binaries decide
//! whether and how to collect them.

use crate::config::{ConfigError, LoggingConfig};

/// Installs a global fmt subscriber at the configured level.
///
/// Fails if the level is unknown or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let level = config.max_level()?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(config.ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("failed to install subscriber: {}", e)))
}
