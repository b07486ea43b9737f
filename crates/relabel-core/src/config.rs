use std::path::PathBuf;

use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read corrections file {path}: {source}")]
    CorrectionsFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse corrections file: {0}")]
    CorrectionsFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
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
/// process. Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so it
/// can be tested against a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("RELABEL_ENV", "development"))?;
    let log_level = or_default("RELABEL_LOG_LEVEL", "info");
    let corrections_path = lookup("RELABEL_CORRECTIONS_PATH").ok().map(PathBuf::from);

    let batch_chunk_size = parse_usize("RELABEL_BATCH_CHUNK_SIZE", "100")?;
    if batch_chunk_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "RELABEL_BATCH_CHUNK_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let max_concurrent_batches = parse_usize("RELABEL_MAX_CONCURRENT_BATCHES", "4")?;
    if max_concurrent_batches == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "RELABEL_MAX_CONCURRENT_BATCHES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        corrections_path,
        db_max_connections: parse_u32("RELABEL_DB_MAX_CONNECTIONS", "10")?,
        db_min_connections: parse_u32("RELABEL_DB_MIN_CONNECTIONS", "1")?,
        db_acquire_timeout_secs: parse_u64("RELABEL_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        batch_chunk_size,
        max_concurrent_batches,
        update_max_retries: parse_u32("RELABEL_UPDATE_MAX_RETRIES", "1")?,
        retry_backoff_base_ms: parse_u64("RELABEL_RETRY_BACKOFF_BASE_MS", "500")?,
    })
}

fn parse_environment(raw: &str) -> Result<Environment, ConfigError> {
    match raw {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RELABEL_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
