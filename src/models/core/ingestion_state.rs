//! # Ingestion State Model
//!
//! The persisted watermark. A single keyed row whose value is the highest
//! source-record identifier considered fully attempted by ingestion.
//!
//! The value is monotonically non-decreasing and is written exactly once per
//! non-empty batch, after every selected record has been attempted. It is
//! never rolled back except by manual intervention.
//!
//! Maps to `raw.ingestion_state (key TEXT PRIMARY KEY, value BIGINT, updated_at)`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// One watermark row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IngestionState {
    pub key: String,
    pub value: i64,
    pub updated_at: DateTime<Utc>,
}

impl IngestionState {
    /// Read the watermark value for `key`, or 0 when no row exists yet.
    pub async fn load(pool: &PgPool, key: &str) -> Result<i64, sqlx::Error> {
        let row = sqlx::query_as::<_, IngestionState>(
            "SELECT key, value, updated_at FROM raw.ingestion_state WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|state| state.value).unwrap_or(0))
    }

    /// Upsert the watermark value for `key`.
    pub async fn upsert(pool: &PgPool, key: &str, value: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO raw.ingestion_state (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

        Ok(())
    }
}
