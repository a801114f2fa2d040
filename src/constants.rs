//! # System Constants
//!
//! Operational defaults and boundaries for the ingestion pipeline.

/// Default number of source records selected per batch invocation.
pub const DEFAULT_BATCH_SIZE: u32 = 50;

/// Watermark row key in the ingestion state table.
pub const WATERMARK_KEY: &str = "last_processed_record_id";

/// Per-request geocoding timeout in milliseconds.
pub const DEFAULT_GEOCODE_TIMEOUT_MS: u64 = 30_000;

/// Transport-level attempts per geocoding call. This bounds retries of
/// timeouts and 5xx responses within one record attempt; it is distinct from
/// the batch policy of never re-attempting a failed record on a later run.
pub const DEFAULT_TRANSPORT_ATTEMPTS: u32 = 3;

/// Base backoff between transport-level retries in milliseconds. Doubles per
/// attempt.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Valid latitude range, degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range, degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Decimal digits kept when formatting waypoint coordinates in the
/// consolidated view.
pub const WAYPOINT_DECIMAL_DIGITS: usize = 6;

/// Default bind address for the record import API.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8002";

/// Default database pool size.
pub const DEFAULT_POOL_SIZE: u32 = 10;
