//! Postgres consolidation transform.
//!
//! Rebuilds `analytics.consolidated_geocodes` from the staging layer in one
//! transaction, applying the same dedup/validate/flatten semantics as the
//! in-memory transform: distinct result identifiers, latest valid row per
//! source record, aggregated child collections, waypoints rounded to 6
//! decimal digits.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

use super::{ConsolidationOutcome, ConsolidationStep};
use crate::error::{GeoflowError, Result};

const CONSOLIDATE_SQL: &str = r#"
WITH distinct_results AS (
    SELECT DISTINCT ON (result_id)
           id, result_id, source_record_id, formatted_address,
           latitude, longitude, location_type, place_id, ingested_at
    FROM staging.geocode_results
    ORDER BY result_id, id
),
valid AS (
    SELECT * FROM distinct_results
    WHERE latitude IS NOT NULL
      AND longitude IS NOT NULL
      AND latitude BETWEEN -90 AND 90
      AND longitude BETWEEN -180 AND 180
),
latest AS (
    SELECT DISTINCT ON (source_record_id) *
    FROM valid
    ORDER BY source_record_id, ingested_at DESC, id DESC
)
INSERT INTO analytics.consolidated_geocodes (
    result_id, source_record_id, formatted_address, latitude, longitude,
    location_type, place_id, component_names, type_tags,
    waypoint_count, waypoint_list, consolidated_at
)
SELECT
    l.result_id,
    l.source_record_id,
    l.formatted_address,
    l.latitude,
    l.longitude,
    l.location_type,
    l.place_id,
    COALESCE((
        SELECT string_agg(DISTINCT c.long_name, ', ' ORDER BY c.long_name)
        FROM staging.geocode_address_components c
        WHERE c.result_id = l.result_id
    ), ''),
    COALESCE((
        SELECT string_agg(DISTINCT t.type_tag, ', ' ORDER BY t.type_tag)
        FROM staging.geocode_result_types t
        WHERE t.result_id = l.result_id
    ), ''),
    COALESCE((
        SELECT COUNT(*)
        FROM staging.geocode_waypoints w
        WHERE w.result_id = l.result_id
    ), 0),
    COALESCE((
        SELECT string_agg(
            '(' || ROUND(w.latitude::numeric, 6) || ', ' || ROUND(w.longitude::numeric, 6) || ')',
            '; ' ORDER BY w.position
        )
        FROM staging.geocode_waypoints w
        WHERE w.result_id = l.result_id
    ), ''),
    NOW()
FROM latest l
"#;

const REJECTED_COUNT_SQL: &str = r#"
SELECT COUNT(*) AS rejected
FROM (
    SELECT DISTINCT ON (result_id) latitude, longitude
    FROM staging.geocode_results
    ORDER BY result_id, id
) r
WHERE r.latitude IS NULL
   OR r.longitude IS NULL
   OR r.latitude NOT BETWEEN -90 AND 90
   OR r.longitude NOT BETWEEN -180 AND 180
"#;

const DUPLICATE_IDS_SQL: &str = r#"
SELECT result_id::text AS result_id
FROM analytics.consolidated_geocodes
GROUP BY result_id
HAVING COUNT(*) > 1
"#;

/// Full-rebuild consolidation into `analytics.consolidated_geocodes`.
#[derive(Clone)]
pub struct PostgresConsolidation {
    pool: PgPool,
}

impl PostgresConsolidation {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Data check: result identifiers appearing more than once in the
    /// consolidated table. Always empty given the primary key; kept as an
    /// explicit check to match the warehouse test suite.
    pub async fn check_unique_result_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(DUPLICATE_IDS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GeoflowError::database("check_unique_result_ids", e))?;

        Ok(rows.iter().map(|row| row.get::<String, _>("result_id")).collect())
    }
}

#[async_trait]
impl ConsolidationStep for PostgresConsolidation {
    #[instrument(skip(self))]
    async fn run(&self) -> Result<ConsolidationOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| GeoflowError::database("begin_consolidation", e))?;

        sqlx::query("DELETE FROM analytics.consolidated_geocodes")
            .execute(&mut *tx)
            .await
            .map_err(|e| GeoflowError::database("clear_consolidated", e))?;

        let inserted = sqlx::query(CONSOLIDATE_SQL)
            .execute(&mut *tx)
            .await
            .map_err(|e| GeoflowError::database("consolidate_geocodes", e))?
            .rows_affected();

        let rejected: i64 = sqlx::query(REJECTED_COUNT_SQL)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| GeoflowError::database("count_rejected", e))?
            .get("rejected");

        tx.commit()
            .await
            .map_err(|e| GeoflowError::database("commit_consolidation", e))?;

        let outcome = ConsolidationOutcome {
            consolidated: inserted as usize,
            rejected: rejected as usize,
        };

        info!(
            consolidated = outcome.consolidated,
            rejected = outcome.rejected,
            "consolidated view rebuilt"
        );

        Ok(outcome)
    }
}
