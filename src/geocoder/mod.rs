//! # Geocoding Client
//!
//! Seam between the checkpointer and the external geocoding service.
//!
//! ## Overview
//!
//! The [`Geocoder`] trait takes a formatted address string and returns a
//! structured payload or a typed error. The production implementation is
//! [`HttpGeocoder`], a reqwest client with a per-request timeout and a small
//! bounded transport-level retry for timeouts and 5xx responses.
//!
//! Transport retries happen inside one record attempt. They are distinct
//! from the batch policy: a record whose attempts are exhausted is counted
//! as failed and never re-attempted on a later run.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::models::{AddressComponent, Waypoint};

pub use http::HttpGeocoder;

/// Structured payload returned by a successful geocoding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodePayload {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: Option<String>,
    pub place_id: Option<String>,
    pub components: Vec<AddressComponent>,
    pub types: Vec<String>,
    pub waypoints: Vec<Waypoint>,
}

/// Geocoding call failures.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("service returned status {status}")]
    Status { status: u16 },

    #[error("malformed response payload: {message}")]
    MalformedPayload { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("no result returned for address")]
    NoResult,
}

impl GeocodeError {
    /// Whether another transport-level attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status } => *status >= 500 || *status == 429,
            Self::MalformedPayload { .. } | Self::NoResult => false,
        }
    }
}

/// Synchronous request/response geocoding seam.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode one formatted address string.
    async fn geocode(&self, address: &str) -> Result<GeocodePayload, GeocodeError>;
}

/// Configuration for the HTTP geocoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL of the geocoding endpoint
    pub base_url: String,
    /// Service credential passed as the `apikey` query parameter
    pub api_key: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Transport-level attempts per call (including the first)
    pub max_attempts: u32,
    /// Base backoff between attempts in milliseconds, doubled per attempt
    pub retry_backoff_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.gtelmaps.vn/api/google/geocode/v1/search".to_string(),
            api_key: String::new(),
            timeout_ms: constants::DEFAULT_GEOCODE_TIMEOUT_MS,
            max_attempts: constants::DEFAULT_TRANSPORT_ATTEMPTS,
            retry_backoff_ms: constants::DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GeocodeError::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(GeocodeError::Status { status: 503 }.is_retryable());
        assert!(GeocodeError::Status { status: 429 }.is_retryable());
        assert!(!GeocodeError::Status { status: 404 }.is_retryable());
        assert!(!GeocodeError::NoResult.is_retryable());
        assert!(!GeocodeError::MalformedPayload {
            message: "missing geometry".to_string()
        }
        .is_retryable());
    }
}
