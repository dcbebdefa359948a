use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::stores::UpdateInterval;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let positive_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            secs => Ok(secs),
        }
    };

    let log_level = or_default("FOTD_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default("FOTD_STORES_PATH", "./config/stores.yaml"));
    let http_timeout_secs = positive_secs("FOTD_HTTP_TIMEOUT_SECS", "10")?;
    let http_connect_timeout_secs = positive_secs("FOTD_HTTP_CONNECT_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("FOTD_USER_AGENT", "fotd/0.1 (flavor-of-the-day)");

    let interval_var = "FOTD_DEFAULT_UPDATE_INTERVAL_MINUTES";
    let default_update_interval = UpdateInterval::from_minutes(parse_u64(interval_var, "30")?)
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: interval_var.to_string(),
            reason,
        })?;

    Ok(AppConfig {
        log_level,
        stores_path,
        http_timeout_secs,
        http_connect_timeout_secs,
        user_agent,
        default_update_interval,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
