//! Configuration Loader
//!
//! Resolves [`GeoflowConfig`](super::GeoflowConfig) from environment
//! variables. All required variables are checked before any value is parsed
//! so a deployment with several missing settings gets a single complete
//! report.

use std::env;

use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::{DatabaseConfig, GeoflowConfig, IngestionConfig, WebConfig};
use crate::constants;
use crate::geocoder::GeocoderConfig;

/// Environment variables that must be present for the process to start.
const REQUIRED_VARS: &[&str] = &[
    "POSTGRES_HOST",
    "POSTGRES_PORT",
    "POSTGRES_DB",
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "GEOCODER_API_KEY",
];

/// Load configuration from the process environment.
pub fn load_from_env() -> ConfigResult<GeoflowConfig> {
    let missing: Vec<String> = REQUIRED_VARS
        .iter()
        .filter(|var| env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|var| (*var).to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ConfigurationError::MissingVariables { missing });
    }

    let database = DatabaseConfig {
        host: required("POSTGRES_HOST")?,
        port: parsed_or("POSTGRES_PORT", 5432)?,
        username: required("POSTGRES_USER")?,
        password: required("POSTGRES_PASSWORD")?,
        database: required("POSTGRES_DB")?,
        pool: parsed_or("POSTGRES_POOL_SIZE", constants::DEFAULT_POOL_SIZE)?,
    };

    let geocoder = GeocoderConfig {
        api_key: required("GEOCODER_API_KEY")?,
        base_url: env::var("GEOCODER_BASE_URL")
            .unwrap_or_else(|_| GeocoderConfig::default().base_url),
        timeout_ms: parsed_or("GEOCODER_TIMEOUT_MS", constants::DEFAULT_GEOCODE_TIMEOUT_MS)?,
        max_attempts: parsed_or(
            "GEOCODER_TRANSPORT_ATTEMPTS",
            constants::DEFAULT_TRANSPORT_ATTEMPTS,
        )?,
        retry_backoff_ms: parsed_or(
            "GEOCODER_RETRY_BACKOFF_MS",
            constants::DEFAULT_RETRY_BACKOFF_MS,
        )?,
    };

    let ingestion = IngestionConfig {
        batch_size: parsed_or("INGESTION_BATCH_SIZE", constants::DEFAULT_BATCH_SIZE)?,
        ..IngestionConfig::default()
    };

    let web = WebConfig {
        bind_address: env::var("GEOFLOW_BIND_ADDRESS")
            .unwrap_or_else(|_| constants::DEFAULT_BIND_ADDRESS.to_string()),
    };

    let config = GeoflowConfig {
        database,
        geocoder,
        ingestion,
        web,
    };

    debug!(
        database_host = %config.database.host,
        pool_size = config.database.pool,
        batch_size = config.ingestion.batch_size,
        "configuration loaded"
    );

    Ok(config)
}

fn required(var: &str) -> ConfigResult<String> {
    env::var(var).map_err(|_| ConfigurationError::MissingVariables {
        missing: vec![var.to_string()],
    })
}

fn parsed_or<T: std::str::FromStr>(var: &str, default: T) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigurationError::invalid_value(var, e.to_string())),
        Err(_) => Ok(default),
    }
}
