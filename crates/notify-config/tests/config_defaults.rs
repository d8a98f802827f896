//! Config defaults and core validation tests for notify-config.
// crates/notify-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults and Core Validation Tests
// Description: Validate default behavior and core config invariants.
// Purpose: Ensure minimal config is valid and critical invariants are enforced.
// =============================================================================

use notify_config::LogFormat;
use notify_config::NotifyConfig;
use notify_config::StoreEngine;
use notify_core::AddSemantics;

mod common;

type TestResult = Result<(), String>;

#[test]
fn default_config_validates() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config != NotifyConfig::default() {
        return Err("empty toml should equal NotifyConfig::default()".to_string());
    }
    Ok(())
}

#[test]
fn defaults_match_documented_values() -> TestResult {
    let config = common::minimal_config().map_err(|err| err.to_string())?;
    let checks = [
        (config.core.port == 8088, "core.port"),
        (config.core.max_notification == 100, "core.max_notification"),
        (config.core.queue_num == 8192, "core.queue_num"),
        (config.core.max_body_bytes == 2 * 1024 * 1024, "core.max_body_bytes"),
        (config.api.push_uri == "/api/push", "api.push_uri"),
        (config.api.metric_uri == "/metrics", "api.metric_uri"),
        (config.stat.engine == StoreEngine::Memory, "stat.engine"),
        (config.stat.add_semantics == AddSemantics::Increment, "stat.add_semantics"),
        (config.stat.nats.bucket == "notify", "stat.nats.bucket"),
        (config.log.format == LogFormat::Text, "log.format"),
        (!config.core.auto_tls.enabled, "core.auto_tls.enabled"),
    ];
    for (ok, name) in checks {
        if !ok {
            return Err(format!("unexpected default for {name}"));
        }
    }
    Ok(())
}

#[test]
fn zero_max_notification_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.max_notification = 0;
    common::assert_invalid(config.validate(), "max_notification must be greater than zero")
}

#[test]
fn zero_body_limit_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.max_body_bytes = 0;
    common::assert_invalid(config.validate(), "core.max_body_bytes must be between")
}

#[test]
fn zero_queue_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.queue_num = 0;
    common::assert_invalid(config.validate(), "queue_num must be greater than zero")
}

#[test]
fn invalid_address_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.address = "not-an-ip".to_string();
    common::assert_invalid(config.validate(), "invalid core.address")
}

#[test]
fn empty_address_binds_all_interfaces() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.address = String::new();
    let addr = config.core.http_addr().map_err(|err| err.to_string())?;
    if addr.to_string() != "0.0.0.0:8088" {
        return Err(format!("unexpected bind address {addr}"));
    }
    Ok(())
}

#[test]
fn explicit_worker_count_wins() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.core.worker_num = 3;
    if config.core.effective_workers() != 3 {
        return Err("worker_num override ignored".to_string());
    }
    config.core.worker_num = 0;
    if config.core.effective_workers() == 0 {
        return Err("auto worker count must be positive".to_string());
    }
    Ok(())
}

#[test]
fn unknown_log_level_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.log.level = "loud".to_string();
    common::assert_invalid(config.validate(), "unsupported log.level")
}

#[test]
fn parse_errors_surface() -> TestResult {
    match NotifyConfig::from_toml("[core]\nport = \"eighty\"") {
        Err(err) if err.to_string().contains("config parse error") => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}
