//! Store seams for the checkpointer.
//!
//! These traits decouple the checkpointer from its backing storage so the
//! batch semantics can be exercised against in-memory implementations while
//! production runs against Postgres.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GeocodeResult, NewSourceRecord, SourceRecord};

/// Append-only source of address records with store-assigned, monotonically
/// increasing identifiers.
#[async_trait]
pub trait SourceRecordStore: Send + Sync {
    /// Append records, assigning ascending identifiers. Existing identifiers
    /// are never mutated or reordered.
    async fn append(&self, records: Vec<NewSourceRecord>) -> Result<Vec<SourceRecord>>;

    /// Select up to `limit` records with identifier strictly above
    /// `after_id`, ordered ascending by identifier.
    async fn fetch_after(&self, after_id: i64, limit: u32) -> Result<Vec<SourceRecord>>;

    /// Find one record by identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<SourceRecord>>;

    /// List all records in identifier order.
    async fn list(&self) -> Result<Vec<SourceRecord>>;
}

/// Persisted watermark, keyed per ingestion process.
///
/// The watermark is the highest source-record identifier considered fully
/// attempted. Implementations must make `commit` atomic with respect to
/// readers: no observer may see a value that does not correspond to a
/// fully-attempted batch.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Read the watermark for `key`; 0 when never written.
    async fn load(&self, key: &str) -> Result<i64>;

    /// Atomically set the watermark for `key`.
    async fn commit(&self, key: &str, value: i64) -> Result<()>;
}

/// Durable staging for raw geocode results.
///
/// Delivery is at-least-once under crash recovery: the same source record
/// may be staged more than once, and consolidation deduplicates downstream.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Durably append one result with its child collections.
    async fn append(&self, result: &GeocodeResult) -> Result<()>;

    /// Fetch all staged results.
    async fn fetch_all(&self) -> Result<Vec<GeocodeResult>>;
}
