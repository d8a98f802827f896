// crates/notify-cli/src/logging.rs
// ============================================================================
// Module: Logging Setup
// Description: tracing-subscriber initialization from LogConfig.
// Purpose: Install one global subscriber with env override support.
// Dependencies: notify-config, tracing-subscriber
// ============================================================================

use notify_config::LogConfig;
use notify_config::LogFormat;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Builds the level filter: `RUST_LOG` when set, otherwise `log.level`.
///
/// # Errors
///
/// Returns a message when the configured level cannot be parsed.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, String> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_ascii_lowercase()))
        .map_err(|err| format!("invalid log level {}: {err}", config.level))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns a message when the filter is invalid or a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), String> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
    };
    result.map_err(|err| format!("tracing init failed: {err}"))
}
