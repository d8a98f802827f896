// crates/notify-server/src/error.rs
// ============================================================================
// Module: Server Errors
// Description: Startup and transport failures for the notification server.
// Purpose: Give the CLI one error type to report and map to an exit code.
// Dependencies: notify-config, notify-core, thiserror
// ============================================================================

use notify_config::ConfigError;
use notify_core::StorageError;
use thiserror::Error;

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be applied.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A component failed to initialize.
    #[error("server init failed: {0}")]
    Init(String),
    /// Counter store bootstrap failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Listener could not bind or serve.
    #[error("server transport error: {0}")]
    Transport(String),
    /// TLS material could not be loaded.
    #[error("server tls error: {0}")]
    Tls(String),
}
