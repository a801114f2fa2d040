//! # Geoflow Configuration System
//!
//! Environment-driven configuration for the ingestion pipeline. Connection
//! parameters, geocoder credentials, batch size, and the web bind address are
//! externally supplied constants resolved once at process start.
//!
//! Required variables are validated up front and reported together, so a
//! misconfigured deployment fails at startup with one actionable message
//! instead of failing record by record.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use geoflow_core::config::GeoflowConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeoflowConfig::from_env()?;
//! let database_url = config.database.database_url();
//! let batch_size = config.ingestion.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::geocoder::GeocoderConfig;

pub use error::ConfigurationError;

/// Root configuration for the pipeline process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoflowConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Geocoding service endpoint and credential
    pub geocoder: GeocoderConfig,

    /// Checkpointed ingestion settings
    pub ingestion: IngestionConfig,

    /// Record import API settings
    pub web: WebConfig,
}

impl GeoflowConfig {
    /// Load configuration from environment variables, reporting all missing
    /// required variables at once.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        loader::load_from_env()
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool: u32,
}

impl DatabaseConfig {
    /// Build a PostgreSQL connection URL from the component parts.
    pub fn database_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// Checkpointed ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestionConfig {
    /// Upper bound on records selected per batch invocation
    pub batch_size: u32,
    /// Key of the watermark row in the ingestion state table
    pub watermark_key: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            watermark_key: constants::WATERMARK_KEY.to_string(),
        }
    }
}

/// Record import API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    pub bind_address: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: constants::DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}
