//! HTTP geocoder implementation.
//!
//! Targets a Google-geocode-shaped endpoint: the address and credential go
//! out as `address`/`apikey` query parameters and the response carries a
//! `results` array with geometry, place id, address components, type tags,
//! and navigation points.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{GeocodeError, GeocodePayload, Geocoder, GeocoderConfig};
use crate::models::{AddressComponent, Waypoint};

/// Production geocoding client.
#[derive(Clone)]
pub struct HttpGeocoder {
    client: Client,
    config: GeocoderConfig,
}

impl HttpGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("geoflow-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    async fn request_once(&self, address: &str) -> Result<GeocodePayload, GeocodeError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("address", address), ("apikey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            GeocodeError::MalformedPayload {
                message: e.to_string(),
            }
        })?;

        body.into_payload()
    }

    fn classify_reqwest_error(&self, error: &reqwest::Error) -> GeocodeError {
        if error.is_timeout() {
            GeocodeError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
        } else {
            GeocodeError::Transport {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodePayload, GeocodeError> {
        let max_attempts = self.config.max_attempts.max(1);

        let mut last_error = GeocodeError::NoResult;
        for attempt in 1..=max_attempts {
            match self.request_once(address).await {
                Ok(payload) => {
                    debug!(address = %address, attempt, "geocode call succeeded");
                    return Ok(payload);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let backoff = self.config.retry_backoff_ms << (attempt - 1);
                    warn!(
                        address = %address,
                        attempt,
                        backoff_ms = backoff,
                        error = %error,
                        "geocode attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    last_error = error;
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error)
    }
}

/// Wire format of the geocoding endpoint.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResultWire>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultWire {
    formatted_address: Option<String>,
    geometry: Option<GeometryWire>,
    place_id: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponentWire>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    navigation_points: Vec<NavigationPointWire>,
}

#[derive(Debug, Deserialize)]
struct GeometryWire {
    location: Option<LocationWire>,
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationWire {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponentWire {
    long_name: String,
    short_name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NavigationPointWire {
    location: Option<NavigationLocationWire>,
}

#[derive(Debug, Deserialize)]
struct NavigationLocationWire {
    latitude: f64,
    longitude: f64,
}

impl GeocodeResponse {
    fn into_payload(self) -> Result<GeocodePayload, GeocodeError> {
        let result = self.results.into_iter().next().ok_or(GeocodeError::NoResult)?;

        let geometry = result.geometry.ok_or_else(|| GeocodeError::MalformedPayload {
            message: "result missing geometry".to_string(),
        })?;
        let location = geometry.location.ok_or_else(|| GeocodeError::MalformedPayload {
            message: "geometry missing location".to_string(),
        })?;
        let formatted_address =
            result
                .formatted_address
                .ok_or_else(|| GeocodeError::MalformedPayload {
                    message: "result missing formatted_address".to_string(),
                })?;

        Ok(GeocodePayload {
            formatted_address,
            latitude: location.lat,
            longitude: location.lng,
            location_type: geometry.location_type,
            place_id: result.place_id,
            components: result
                .address_components
                .into_iter()
                .map(|c| AddressComponent {
                    long_name: c.long_name,
                    short_name: c.short_name,
                    types: c.types,
                })
                .collect(),
            types: result.types,
            waypoints: result
                .navigation_points
                .into_iter()
                .filter_map(|p| p.location)
                .map(|l| Waypoint {
                    latitude: l.latitude,
                    longitude: l.longitude,
                })
                .collect(),
        })
    }
}
