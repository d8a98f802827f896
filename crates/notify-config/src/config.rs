// crates/notify-config/src/config.rs
// ============================================================================
// Module: Notify Configuration
// Description: Configuration loading and validation for the notify server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: notify-core, serde, toml, serde_yaml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every field has a default, so an empty file (or no file at the default
//! location) yields a runnable in-memory configuration. Invalid values fail
//! closed at load time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use notify_core::AddSemantics;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "notify.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "NOTIFY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `core.max_notification`.
pub(crate) const MAX_NOTIFICATION_LIMIT: usize = 100_000;
/// Upper bound for `core.queue_num`.
pub(crate) const MAX_QUEUE_CAPACITY: usize = 1_048_576;
/// Upper bound for `core.max_body_bytes`.
pub(crate) const MAX_BODY_LIMIT: usize = 64 * 1024 * 1024;
/// Upper bound for `core.worker_num`.
pub(crate) const MAX_WORKERS: usize = 4_096;
/// Log levels accepted by `log.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Notify server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Listener, batching, and worker settings.
    #[serde(default)]
    pub core: CoreConfig,
    /// HTTP route configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Counter storage configuration.
    #[serde(default)]
    pub stat: StatConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl NotifyConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// An explicit `path` or `NOTIFY_CONFIG` must point at an existing file.
    /// When neither is set and `notify.toml` is absent, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core.validate()?;
        self.api.validate()?;
        self.stat.validate()?;
        self.log.validate()?;
        Ok(())
    }

    /// Renders the configuration as YAML for the config snapshot endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] when serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|err| ConfigError::Render(err.to_string()))
    }
}

/// Listener, batching, and worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Listen address; empty means all interfaces.
    #[serde(default = "default_address")]
    pub address: String,
    /// Plain HTTP (or static TLS) listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum notifications accepted in one request.
    #[serde(default = "default_max_notification")]
    pub max_notification: usize,
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Dispatch worker count; zero selects available parallelism.
    #[serde(default)]
    pub worker_num: usize,
    /// Dispatch queue capacity in batches.
    #[serde(default = "default_queue_num")]
    pub queue_num: usize,
    /// Time allowed for in-flight batches to drain at shutdown.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Static certificate TLS.
    #[serde(default)]
    pub ssl: SslConfig,
    /// ACME-provisioned TLS.
    #[serde(default)]
    pub auto_tls: AutoTlsConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_notification: default_max_notification(),
            max_body_bytes: default_max_body_bytes(),
            worker_num: 0,
            queue_num: default_queue_num(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            ssl: SslConfig::default(),
            auto_tls: AutoTlsConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Validates core settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_notification == 0 {
            return Err(ConfigError::Invalid(
                "core.max_notification must be greater than zero".to_string(),
            ));
        }
        if self.max_notification > MAX_NOTIFICATION_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "core.max_notification exceeds {MAX_NOTIFICATION_LIMIT}"
            )));
        }
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "core.max_body_bytes must be between 1 and {MAX_BODY_LIMIT}"
            )));
        }
        if self.queue_num == 0 {
            return Err(ConfigError::Invalid(
                "core.queue_num must be greater than zero".to_string(),
            ));
        }
        if self.queue_num > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "core.queue_num exceeds {MAX_QUEUE_CAPACITY}"
            )));
        }
        if self.worker_num > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!("core.worker_num exceeds {MAX_WORKERS}")));
        }
        self.listen_ip()?;
        self.ssl.validate()?;
        self.auto_tls.validate()?;
        if self.ssl.enabled && self.auto_tls.enabled {
            return Err(ConfigError::Invalid(
                "core.ssl and core.auto_tls are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the parsed listen IP (unspecified when `address` is empty).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `address` is not an IP address.
    pub fn listen_ip(&self) -> Result<IpAddr, ConfigError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        address
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid core.address: {address}")))
    }

    /// Socket address for the plain HTTP or static TLS listener.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `address` is not an IP address.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.listen_ip()?, self.port))
    }

    /// Socket address for the ACME TLS listener.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `address` is not an IP address.
    pub fn auto_tls_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.listen_ip()?, self.auto_tls.port))
    }

    /// Effective worker count.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.worker_num > 0 {
            return self.worker_num;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}

/// Static certificate TLS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    /// Enables TLS with the configured certificate and key.
    #[serde(default)]
    pub enabled: bool,
    /// PEM certificate chain path.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    /// PEM private key path.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

impl SslConfig {
    /// Validates static TLS settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        let (Some(cert), Some(key)) = (&self.cert_path, &self.key_path) else {
            return Err(ConfigError::Invalid(
                "core.ssl requires cert_path and key_path".to_string(),
            ));
        };
        validate_path(cert)?;
        validate_path(key)
    }
}

/// ACME-provisioned TLS configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTlsConfig {
    /// Enables the ACME front door.
    #[serde(default)]
    pub enabled: bool,
    /// Directory used to cache account keys and certificates.
    #[serde(default = "default_auto_tls_folder")]
    pub folder: PathBuf,
    /// Hostname certificates are requested for.
    #[serde(default)]
    pub host: String,
    /// Uses the production directory instead of staging.
    #[serde(default)]
    pub production: bool,
    /// Optional contact e-mail registered with the authority.
    #[serde(default)]
    pub contact: Option<String>,
    /// Secure listen port.
    #[serde(default = "default_auto_tls_port")]
    pub port: u16,
}

impl Default for AutoTlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: default_auto_tls_folder(),
            host: String::new(),
            production: false,
            contact: None,
            port: default_auto_tls_port(),
        }
    }
}

impl AutoTlsConfig {
    /// Validates ACME settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Invalid("core.auto_tls.host must be set".to_string()));
        }
        if host.contains(['/', ':', ' ']) {
            return Err(ConfigError::Invalid(format!("invalid core.auto_tls.host: {host}")));
        }
        if let Some(contact) = &self.contact
            && !contact.contains('@')
        {
            return Err(ConfigError::Invalid(
                "core.auto_tls.contact must be an e-mail address".to_string(),
            ));
        }
        validate_path(&self.folder)
    }
}

/// HTTP route configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Push submission route.
    #[serde(default = "default_push_uri")]
    pub push_uri: String,
    /// Application status route.
    #[serde(default = "default_stat_app_uri")]
    pub stat_app_uri: String,
    /// Configuration snapshot route.
    #[serde(default = "default_config_uri")]
    pub config_uri: String,
    /// Request statistics route.
    #[serde(default = "default_sys_stat_uri")]
    pub sys_stat_uri: String,
    /// Metrics exposition route.
    #[serde(default = "default_metric_uri")]
    pub metric_uri: String,
    /// Health check route.
    #[serde(default = "default_health_uri")]
    pub health_uri: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            push_uri: default_push_uri(),
            stat_app_uri: default_stat_app_uri(),
            config_uri: default_config_uri(),
            sys_stat_uri: default_sys_stat_uri(),
            metric_uri: default_metric_uri(),
            health_uri: default_health_uri(),
        }
    }
}

impl ApiConfig {
    /// Returns `(name, route)` pairs for every configurable route.
    #[must_use]
    pub fn routes(&self) -> [(&'static str, &str); 6] {
        [
            ("api.push_uri", &self.push_uri),
            ("api.stat_app_uri", &self.stat_app_uri),
            ("api.config_uri", &self.config_uri),
            ("api.sys_stat_uri", &self.sys_stat_uri),
            ("api.metric_uri", &self.metric_uri),
            ("api.health_uri", &self.health_uri),
        ]
    }

    /// Validates route shapes and uniqueness.
    fn validate(&self) -> Result<(), ConfigError> {
        let routes = self.routes();
        for (name, route) in routes {
            if !route.starts_with('/') || route.len() < 2 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must start with '/' and not be the root route"
                )));
            }
            if route.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!("{name} must not contain whitespace")));
            }
            if route.contains(['{', '}'])
                || route.split('/').any(|segment| segment.starts_with([':', '*']))
            {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a literal path without captures or wildcards"
                )));
            }
        }
        for (index, (name, route)) in routes.iter().enumerate() {
            if routes[index + 1..].iter().any(|(_, other)| other == route) {
                return Err(ConfigError::Invalid(format!("{name} duplicates another route")));
            }
        }
        Ok(())
    }
}

/// Counter storage engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEngine {
    /// Process-local in-memory counters.
    #[default]
    Memory,
    /// NATS JetStream key-value bucket.
    Nats,
}

/// Counter storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatConfig {
    /// Storage engine.
    #[serde(default)]
    pub engine: StoreEngine,
    /// Behavior of counter `add`.
    #[serde(default)]
    pub add_semantics: AddSemantics,
    /// NATS settings, used when `engine = "nats"`.
    #[serde(default)]
    pub nats: NatsConfig,
}

impl StatConfig {
    /// Validates storage settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine == StoreEngine::Nats {
            self.nats.validate()?;
        }
        Ok(())
    }
}

/// NATS connection and bucket settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URL.
    #[serde(default = "default_nats_addr")]
    pub addr: String,
    /// Key-value bucket name.
    #[serde(default = "default_nats_bucket")]
    pub bucket: String,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_nats_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            addr: default_nats_addr(),
            bucket: default_nats_bucket(),
            connect_timeout_ms: default_nats_connect_timeout_ms(),
        }
    }
}

impl NatsConfig {
    /// Validates NATS settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("stat.nats.addr must be set".to_string()));
        }
        if self.bucket.is_empty()
            || !self.bucket.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(ConfigError::Invalid(
                "stat.nats.bucket must be non-empty and use [A-Za-z0-9_-]".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "stat.nats.connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!("unsupported log.level: {}", self.level)));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

fn default_address() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8088
}

const fn default_max_notification() -> usize {
    100
}

const fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

const fn default_queue_num() -> usize {
    8192
}

const fn default_shutdown_timeout_ms() -> u64 {
    30_000
}

fn default_auto_tls_folder() -> PathBuf {
    PathBuf::from(".cache")
}

const fn default_auto_tls_port() -> u16 {
    443
}

fn default_push_uri() -> String {
    "/api/push".to_string()
}

fn default_stat_app_uri() -> String {
    "/api/stat/app".to_string()
}

fn default_config_uri() -> String {
    "/api/config".to_string()
}

fn default_sys_stat_uri() -> String {
    "/sys/stats".to_string()
}

fn default_metric_uri() -> String {
    "/metrics".to_string()
}

fn default_health_uri() -> String {
    "/healthz".to_string()
}

fn default_nats_addr() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_nats_bucket() -> String {
    "notify".to_string()
}

const fn default_nats_connect_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Resolves the config path; the flag reports whether it was explicit.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O errors while reading config.
    #[error("config io error: {0}")]
    Io(String),
    /// Parsing errors for config contents.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Validation errors for config contents.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Snapshot rendering errors.
    #[error("config render error: {0}")]
    Render(String),
}
