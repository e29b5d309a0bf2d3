use crate::app_config::{AppConfig, Environment};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let pos_base_url = require("COMANDA_POS_BASE_URL")?;
    let pos_username = require("COMANDA_POS_USERNAME")?;
    let pos_password = require("COMANDA_POS_PASSWORD")?;

    let env = parse_environment(&or_default("COMANDA_ENV", "development"));
    let log_level = or_default("COMANDA_LOG_LEVEL", "info");
    let webdriver_url = or_default("COMANDA_WEBDRIVER_URL", "http://localhost:9515");

    let operation_timeout_secs = parse_u64("COMANDA_OPERATION_TIMEOUT_SECS", "30")?;
    let locator_timeout_secs = parse_u64("COMANDA_LOCATOR_TIMEOUT_SECS", "10")?;
    let click_retries = parse_u32("COMANDA_CLICK_RETRIES", "3")?;
    let click_pause_ms = parse_u64("COMANDA_CLICK_PAUSE_MS", "300")?;

    let sync_base_url = lookup("COMANDA_SYNC_BASE_URL").ok();
    let sync_timeout_secs = parse_u64("COMANDA_SYNC_TIMEOUT_SECS", "180")?;
    let artifact_sink_url = lookup("COMANDA_ARTIFACT_SINK_URL").ok();

    Ok(AppConfig {
        env,
        log_level,
        pos_base_url,
        pos_username,
        pos_password,
        webdriver_url,
        operation_timeout_secs,
        locator_timeout_secs,
        click_retries,
        click_pause_ms,
        sync_base_url,
        sync_timeout_secs,
        artifact_sink_url,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
