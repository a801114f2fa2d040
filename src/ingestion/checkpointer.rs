//! # Incremental Ingestion Checkpointer
//!
//! ## Architecture: Exactly-Once-Effective Progress Over an Append-Only Source
//!
//! The checkpointer produces forward progress over an unbounded, append-only
//! source of records despite an unreliable per-record external call. It reads
//! the watermark, selects the next contiguous batch of unprocessed records in
//! ascending identifier order, attempts each record sequentially, and then
//! advances the watermark exactly once, to the highest identifier attempted.
//!
//! Ascending-order selection is load-bearing: the watermark always describes
//! a *contiguous prefix* of fully-attempted records, so resuming after a
//! crash never skips a record.
//!
//! ## Delivery Semantics
//!
//! - **At-most-one-attempt per record across runs.** A record that fails
//!   geocoding is counted, its identifier reported, and the watermark still
//!   advances past it. It is never re-attempted automatically.
//! - **At-least-once staging delivery under crash.** A crash after staging
//!   writes but before the watermark commit causes the next invocation to
//!   re-select and re-attempt the same batch; duplicates are deduplicated at
//!   consolidation.
//! - **Batch-level durability point.** Staging writes flush per record, but
//!   the watermark is written only after every selected record has been
//!   attempted. A watermark write failure records no progress.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geoflow_core::geocoder::{GeocoderConfig, HttpGeocoder};
//! use geoflow_core::ingestion::{
//!     Checkpointer, InMemorySourceRecordStore, InMemoryStagingStore, InMemoryWatermarkStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let checkpointer = Checkpointer::new(
//!     Arc::new(InMemorySourceRecordStore::new()),
//!     Arc::new(InMemoryWatermarkStore::new()),
//!     Arc::new(InMemoryStagingStore::new()),
//!     Arc::new(HttpGeocoder::new(GeocoderConfig::default())?),
//! );
//!
//! let outcome = checkpointer.run_batch(50).await?;
//! println!("watermark now {}", outcome.watermark);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::stores::{SourceRecordStore, StagingStore, WatermarkStore};
use super::types::{BatchRunOutcome, CancellationToken};
use crate::constants;
use crate::error::{GeoflowError, Result};
use crate::geocoder::Geocoder;
use crate::models::{GeocodeResult, SourceRecord};

/// Configuration for checkpointed ingestion.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    /// Batch size used when the caller does not pass one explicitly
    pub default_batch_size: u32,
    /// Watermark row key; one key per ingestion process
    pub watermark_key: String,
}

impl Default for CheckpointerConfig {
    fn default() -> Self {
        Self {
            default_batch_size: constants::DEFAULT_BATCH_SIZE,
            watermark_key: constants::WATERMARK_KEY.to_string(),
        }
    }
}

/// Checkpointed batch ingestion over the store and geocoder seams.
pub struct Checkpointer {
    source: Arc<dyn SourceRecordStore>,
    watermark: Arc<dyn WatermarkStore>,
    staging: Arc<dyn StagingStore>,
    geocoder: Arc<dyn Geocoder>,
    config: CheckpointerConfig,
    /// Serializes the watermark read-modify-write critical section. A second
    /// concurrent invocation is rejected, not queued.
    run_lock: Mutex<()>,
}

impl Checkpointer {
    pub fn new(
        source: Arc<dyn SourceRecordStore>,
        watermark: Arc<dyn WatermarkStore>,
        staging: Arc<dyn StagingStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self::with_config(source, watermark, staging, geocoder, CheckpointerConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn SourceRecordStore>,
        watermark: Arc<dyn WatermarkStore>,
        staging: Arc<dyn StagingStore>,
        geocoder: Arc<dyn Geocoder>,
        config: CheckpointerConfig,
    ) -> Self {
        Self {
            source,
            watermark,
            staging,
            geocoder,
            config,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    /// Run one batch of up to `batch_size` records.
    pub async fn run_batch(&self, batch_size: u32) -> Result<BatchRunOutcome> {
        self.run_batch_cancellable(batch_size, &CancellationToken::new())
            .await
    }

    /// Run one batch with cooperative cancellation.
    ///
    /// The token is checked before each record attempt. On cancellation the
    /// invocation returns [`GeoflowError::Cancelled`] without advancing the
    /// watermark; staging rows already written remain and the whole batch is
    /// re-attempted on the next invocation.
    #[instrument(skip(self, token), fields(watermark_key = %self.config.watermark_key))]
    pub async fn run_batch_cancellable(
        &self,
        batch_size: u32,
        token: &CancellationToken,
    ) -> Result<BatchRunOutcome> {
        if batch_size == 0 {
            return Err(GeoflowError::validation("batch_size must be at least 1"));
        }

        let _guard = self.run_lock.try_lock().map_err(|_| {
            GeoflowError::ConcurrentInvocation {
                key: self.config.watermark_key.clone(),
            }
        })?;

        let key = self.config.watermark_key.as_str();
        let watermark = self.watermark.load(key).await?;
        let records = self.source.fetch_after(watermark, batch_size).await?;

        if records.is_empty() {
            debug!(watermark, "no unprocessed records above watermark");
            return Ok(BatchRunOutcome::no_op(watermark));
        }

        let selected = records.len();
        let mut outcome = BatchRunOutcome::default();
        let mut highest_attempted = watermark;

        for record in &records {
            if token.is_cancelled() {
                warn!(
                    attempted = outcome.attempted,
                    selected,
                    watermark,
                    "batch cancelled between record attempts; watermark unchanged"
                );
                return Err(GeoflowError::Cancelled {
                    attempted: outcome.attempted,
                    selected,
                });
            }

            match self.attempt_record(record).await {
                Ok(()) => outcome.succeeded += 1,
                Err(error) => {
                    // Failure isolation: one bad record never aborts the batch.
                    warn!(
                        record_id = record.id,
                        error = %error,
                        "record attempt failed, continuing batch"
                    );
                    outcome.failed += 1;
                    outcome.failed_ids.push(record.id);
                }
            }

            outcome.attempted += 1;
            highest_attempted = record.id;
        }

        // Batch durability point. Every selected record has been attempted;
        // this is the only watermark write of the invocation.
        self.watermark
            .commit(key, highest_attempted)
            .await
            .map_err(|e| GeoflowError::watermark_commit(highest_attempted, e))?;
        outcome.watermark = highest_attempted;

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            watermark = outcome.watermark,
            "batch complete"
        );

        Ok(outcome)
    }

    /// Drain the source: run batches until a selection comes back empty.
    ///
    /// Totals are accumulated across batches. Cancellation is honored both
    /// between batches and between record attempts within a batch.
    #[instrument(skip(self, token), fields(watermark_key = %self.config.watermark_key))]
    pub async fn run_to_completion(
        &self,
        batch_size: u32,
        token: &CancellationToken,
    ) -> Result<BatchRunOutcome> {
        let mut totals = BatchRunOutcome::no_op(self.watermark.load(&self.config.watermark_key).await?);

        loop {
            let outcome = self.run_batch_cancellable(batch_size, token).await?;
            if outcome.attempted == 0 {
                break;
            }
            totals.absorb(&outcome);
        }

        info!(
            attempted = totals.attempted,
            succeeded = totals.succeeded,
            failed = totals.failed,
            watermark = totals.watermark,
            "incremental ingestion drained"
        );

        Ok(totals)
    }

    /// Attempt one record: geocode, then stage the result durably.
    async fn attempt_record(&self, record: &SourceRecord) -> Result<()> {
        let address = record.formatted_address();
        debug!(record_id = record.id, address = %address, "geocoding record");

        let payload = self
            .geocoder
            .geocode(&address)
            .await
            .map_err(|source| GeoflowError::Geocode {
                record_id: record.id,
                source,
            })?;

        let result = GeocodeResult::from_payload(record.id, payload);
        self.staging
            .append(&result)
            .await
            .map_err(|e| GeoflowError::staging_write(record.id, e))?;

        Ok(())
    }
}
