#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Geoflow Core
//!
//! Rust core for an incremental geocoding ETL pipeline: address records are
//! imported over HTTP, geocoded in bounded batches against an external
//! service, staged durably, and consolidated into one clean row per result.
//!
//! ## Overview
//!
//! The load-bearing component is the [`ingestion::Checkpointer`]. It owns the
//! ingestion watermark (the highest source-record identifier considered fully
//! attempted), selects the next contiguous batch of unprocessed records,
//! drives per-record geocoding with failure isolation, and advances the
//! watermark exactly once per batch, only after every selected record has
//! been attempted.
//!
//! ## Module Organization
//!
//! - [`models`] - Data layer: source records, geocode results, ingestion state
//! - [`database`] - Connection pooling and schema bootstrap
//! - [`ingestion`] - Checkpointer, store seams, Postgres and in-memory stores
//! - [`geocoder`] - Geocoding client seam and HTTP implementation
//! - [`consolidation`] - Deduplication, flattening, and data checks
//! - [`pipeline`] - Ordered two-step pipeline (ingest, then consolidate)
//! - [`web`] - HTTP import surface for source records
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//!
//! ## Delivery Semantics
//!
//! Records carry **at-most-one-attempt** semantics across runs: a record that
//! fails geocoding is counted, reported, and never retried automatically. The
//! staging store receives **at-least-once** delivery under crash recovery;
//! the consolidation step deduplicates before results are promoted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geoflow_core::geocoder::{GeocoderConfig, HttpGeocoder};
//! use geoflow_core::ingestion::{
//!     Checkpointer, InMemorySourceRecordStore, InMemoryStagingStore, InMemoryWatermarkStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let geocoder = Arc::new(HttpGeocoder::new(GeocoderConfig::default())?);
//! let checkpointer = Checkpointer::new(
//!     Arc::new(InMemorySourceRecordStore::new()),
//!     Arc::new(InMemoryWatermarkStore::new()),
//!     Arc::new(InMemoryStagingStore::new()),
//!     geocoder,
//! );
//!
//! let outcome = checkpointer.run_batch(50).await?;
//! println!(
//!     "attempted={} succeeded={} failed={} watermark={}",
//!     outcome.attempted, outcome.succeeded, outcome.failed, outcome.watermark
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consolidation;
pub mod constants;
pub mod database;
pub mod error;
pub mod geocoder;
pub mod ingestion;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod web;

pub use config::{ConfigurationError, DatabaseConfig, GeoflowConfig, IngestionConfig, WebConfig};
pub use error::{GeoflowError, Result};
pub use ingestion::{BatchRunOutcome, CancellationToken, Checkpointer, CheckpointerConfig};
pub use pipeline::{Pipeline, PipelineRunOutcome};
