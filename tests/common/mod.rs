//! Shared fixtures: scripted geocoders and fault-injecting store wrappers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::geocoder::{GeocodeError, GeocodePayload, Geocoder};
use geoflow_core::ingestion::{
    CancellationToken, InMemoryStagingStore, InMemoryWatermarkStore, StagingStore, WatermarkStore,
};
use geoflow_core::models::{AddressComponent, GeocodeResult, Waypoint};

/// Deterministic payload for an address, with child collections populated.
pub fn payload_for(address: &str) -> GeocodePayload {
    let seed = address.chars().map(|c| c as u32 as f64).sum::<f64>();
    let latitude = 10.0 + (seed % 10.0);
    let longitude = 105.0 + (seed % 5.0);

    GeocodePayload {
        formatted_address: format!("{address}, Vietnam"),
        latitude,
        longitude,
        location_type: Some("APPROXIMATE".to_string()),
        place_id: Some(format!("place-{}", address.len())),
        components: vec![AddressComponent {
            long_name: address.to_string(),
            short_name: None,
            types: vec!["ward".to_string()],
        }],
        types: vec!["political".to_string(), "ward".to_string()],
        waypoints: vec![Waypoint {
            latitude: latitude + 0.001,
            longitude: longitude - 0.001,
        }],
    }
}

/// Geocoder that fails for a configured set of addresses and records every
/// call it receives.
#[derive(Default)]
pub struct ScriptedGeocoder {
    fail_addresses: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            fail_addresses: addresses.iter().map(|a| (*a).to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodePayload, GeocodeError> {
        self.calls.lock().push(address.to_string());
        if self.fail_addresses.contains(address) {
            return Err(GeocodeError::Status { status: 503 });
        }
        Ok(payload_for(address))
    }
}

/// Geocoder that cancels a token after a configured number of calls, to
/// exercise cooperative cancellation between record attempts.
pub struct CancellingGeocoder {
    token: CancellationToken,
    cancel_after: usize,
    calls: AtomicUsize,
}

impl CancellingGeocoder {
    pub fn new(token: CancellationToken, cancel_after: usize) -> Self {
        Self {
            token,
            cancel_after,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Geocoder for CancellingGeocoder {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodePayload, GeocodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.cancel_after {
            self.token.cancel();
        }
        Ok(payload_for(address))
    }
}

/// Geocoder that parks every call until released, to hold a batch open
/// while a second invocation is attempted.
pub struct BlockingGeocoder {
    started: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Semaphore>,
}

impl BlockingGeocoder {
    pub fn new() -> Self {
        Self {
            started: Arc::new(tokio::sync::Notify::new()),
            release: Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }

    pub fn started(&self) -> Arc<tokio::sync::Notify> {
        Arc::clone(&self.started)
    }

    pub fn release_all(&self, permits: usize) {
        self.release.add_permits(permits);
    }
}

#[async_trait]
impl Geocoder for BlockingGeocoder {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodePayload, GeocodeError> {
        self.started.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|_| GeocodeError::Transport {
                message: "release semaphore closed".to_string(),
            })?;
        permit.forget();
        Ok(payload_for(address))
    }
}

/// Watermark store whose first `failures` commits fail, simulating a crash
/// after staging writes but before the watermark durability point.
pub struct FailOnceWatermarkStore {
    inner: InMemoryWatermarkStore,
    remaining_failures: AtomicUsize,
}

impl FailOnceWatermarkStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: InMemoryWatermarkStore::new(),
            remaining_failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl WatermarkStore for FailOnceWatermarkStore {
    async fn load(&self, key: &str) -> Result<i64> {
        self.inner.load(key).await
    }

    async fn commit(&self, key: &str, value: i64) -> Result<()> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(GeoflowError::database("commit_watermark", "connection reset"));
        }
        self.inner.commit(key, value).await
    }
}

/// Staging store that rejects appends for configured source record ids.
pub struct RejectingStagingStore {
    inner: InMemoryStagingStore,
    reject_record_ids: HashSet<i64>,
}

impl RejectingStagingStore {
    pub fn rejecting(record_ids: &[i64]) -> Self {
        Self {
            inner: InMemoryStagingStore::new(),
            reject_record_ids: record_ids.iter().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl StagingStore for RejectingStagingStore {
    async fn append(&self, result: &GeocodeResult) -> Result<()> {
        if self.reject_record_ids.contains(&result.source_record_id) {
            return Err(GeoflowError::database("stage_geocode_result", "disk full"));
        }
        self.inner.append(result).await
    }

    async fn fetch_all(&self) -> Result<Vec<GeocodeResult>> {
        self.inner.fetch_all().await
    }
}
