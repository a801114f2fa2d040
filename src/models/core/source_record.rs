//! # Source Record Model
//!
//! Address-bearing entities awaiting geocoding.
//!
//! ## Overview
//!
//! A `SourceRecord` is created by the import API with a store-assigned,
//! monotonically increasing identifier that is never reused. Records are
//! immutable once created; the checkpointer only reads them, in ascending
//! identifier order, so the watermark always describes a contiguous prefix
//! of fully-attempted records.
//!
//! ## Database Schema
//!
//! Maps to `raw.source_records`:
//! - `id`: Primary key (BIGSERIAL)
//! - `name`: Address name (TEXT, required)
//! - `district`: Administrative area (TEXT, optional)
//! - `city`: Locality (TEXT, optional)
//! - `created_at`: Insertion timestamp (TIMESTAMPTZ)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// An address record awaiting geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SourceRecord {
    pub id: i64,
    pub name: String,
    pub district: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New source record for creation (identifier assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSourceRecord {
    pub name: String,
    pub district: Option<String>,
    pub city: Option<String>,
}

impl SourceRecord {
    /// The address string submitted to the geocoding service.
    ///
    /// Joins name, district, and city with commas, skipping absent parts.
    pub fn formatted_address(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(district) = self.district.as_deref() {
            parts.push(district);
        }
        if let Some(city) = self.city.as_deref() {
            parts.push(city);
        }
        parts.join(", ")
    }

    /// Insert a new record, returning it with its assigned identifier.
    pub async fn create(pool: &PgPool, new_record: &NewSourceRecord) -> Result<SourceRecord, sqlx::Error> {
        sqlx::query_as::<_, SourceRecord>(
            r#"
            INSERT INTO raw.source_records (name, district, city, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, name, district, city, created_at
            "#,
        )
        .bind(&new_record.name)
        .bind(&new_record.district)
        .bind(&new_record.city)
        .fetch_one(pool)
        .await
    }

    /// Select up to `limit` records with identifier strictly above
    /// `after_id`, ascending. Ordering is load-bearing for the watermark
    /// contract.
    pub async fn fetch_after(
        pool: &PgPool,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<SourceRecord>, sqlx::Error> {
        sqlx::query_as::<_, SourceRecord>(
            r#"
            SELECT id, name, district, city, created_at
            FROM raw.source_records
            WHERE id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Find a record by identifier.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<SourceRecord>, sqlx::Error> {
        sqlx::query_as::<_, SourceRecord>(
            r#"
            SELECT id, name, district, city, created_at
            FROM raw.source_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List all records in identifier order.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<SourceRecord>, sqlx::Error> {
        sqlx::query_as::<_, SourceRecord>(
            r#"
            SELECT id, name, district, city, created_at
            FROM raw.source_records
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
