//! Postgres store implementations.
//!
//! Thin adapters from the store seams onto the model layer's queries. All
//! SQL lives with the models; these types carry the pool and translate
//! `sqlx::Error` into the pipeline error taxonomy with operation context.

use async_trait::async_trait;
use sqlx::PgPool;

use super::stores::{SourceRecordStore, StagingStore, WatermarkStore};
use crate::error::{GeoflowError, Result};
use crate::models::{GeocodeResult, IngestionState, NewSourceRecord, SourceRecord};

/// Source records in `raw.source_records`.
#[derive(Clone)]
pub struct PostgresSourceRecordStore {
    pool: PgPool,
}

impl PostgresSourceRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRecordStore for PostgresSourceRecordStore {
    async fn append(&self, records: Vec<NewSourceRecord>) -> Result<Vec<SourceRecord>> {
        let mut created = Vec::with_capacity(records.len());
        for new_record in &records {
            let record = SourceRecord::create(&self.pool, new_record)
                .await
                .map_err(|e| GeoflowError::database("insert_source_record", e))?;
            created.push(record);
        }
        Ok(created)
    }

    async fn fetch_after(&self, after_id: i64, limit: u32) -> Result<Vec<SourceRecord>> {
        SourceRecord::fetch_after(&self.pool, after_id, i64::from(limit))
            .await
            .map_err(|e| GeoflowError::database("fetch_unprocessed_records", e))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SourceRecord>> {
        SourceRecord::find_by_id(&self.pool, id)
            .await
            .map_err(|e| GeoflowError::database("find_source_record", e))
    }

    async fn list(&self) -> Result<Vec<SourceRecord>> {
        SourceRecord::list_all(&self.pool)
            .await
            .map_err(|e| GeoflowError::database("list_source_records", e))
    }
}

/// Watermark rows in `raw.ingestion_state`.
#[derive(Clone)]
pub struct PostgresWatermarkStore {
    pool: PgPool,
}

impl PostgresWatermarkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatermarkStore for PostgresWatermarkStore {
    async fn load(&self, key: &str) -> Result<i64> {
        IngestionState::load(&self.pool, key)
            .await
            .map_err(|e| GeoflowError::database("load_watermark", e))
    }

    async fn commit(&self, key: &str, value: i64) -> Result<()> {
        IngestionState::upsert(&self.pool, key, value)
            .await
            .map_err(|e| GeoflowError::database("commit_watermark", e))
    }
}

/// Staged geocode results in the `staging` schema.
#[derive(Clone)]
pub struct PostgresStagingStore {
    pool: PgPool,
}

impl PostgresStagingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StagingStore for PostgresStagingStore {
    async fn append(&self, result: &GeocodeResult) -> Result<()> {
        result
            .insert(&self.pool)
            .await
            .map_err(|e| GeoflowError::database("stage_geocode_result", e))
    }

    async fn fetch_all(&self) -> Result<Vec<GeocodeResult>> {
        GeocodeResult::fetch_all(&self.pool)
            .await
            .map_err(|e| GeoflowError::database("fetch_staged_results", e))
    }
}
