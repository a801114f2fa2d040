//! Schema bootstrap.
//!
//! Idempotent DDL for the three pipeline layers: `raw` (source records and
//! ingestion state), `staging` (geocode results and child collections), and
//! `analytics` (the consolidated view). Statements run in order; every
//! statement is `IF NOT EXISTS` so bootstrap is safe to re-run at startup.

use sqlx::PgPool;
use tracing::info;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS raw",
    "CREATE SCHEMA IF NOT EXISTS staging",
    "CREATE SCHEMA IF NOT EXISTS analytics",
    r#"
    CREATE TABLE IF NOT EXISTS raw.source_records (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        district TEXT,
        city TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS raw.ingestion_state (
        key TEXT PRIMARY KEY,
        value BIGINT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staging.geocode_results (
        id BIGSERIAL PRIMARY KEY,
        result_id UUID NOT NULL,
        source_record_id BIGINT NOT NULL,
        formatted_address TEXT NOT NULL,
        latitude DOUBLE PRECISION,
        longitude DOUBLE PRECISION,
        location_type TEXT,
        place_id TEXT,
        ingested_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_geocode_results_result_id ON staging.geocode_results (result_id)",
    "CREATE INDEX IF NOT EXISTS idx_geocode_results_source_record ON staging.geocode_results (source_record_id)",
    r#"
    CREATE TABLE IF NOT EXISTS staging.geocode_address_components (
        id BIGSERIAL PRIMARY KEY,
        result_id UUID NOT NULL,
        long_name TEXT NOT NULL,
        short_name TEXT,
        types TEXT[] NOT NULL DEFAULT '{}'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_geocode_components_result_id ON staging.geocode_address_components (result_id)",
    r#"
    CREATE TABLE IF NOT EXISTS staging.geocode_result_types (
        id BIGSERIAL PRIMARY KEY,
        result_id UUID NOT NULL,
        type_tag TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_geocode_types_result_id ON staging.geocode_result_types (result_id)",
    r#"
    CREATE TABLE IF NOT EXISTS staging.geocode_waypoints (
        id BIGSERIAL PRIMARY KEY,
        result_id UUID NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        position INT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_geocode_waypoints_result_id ON staging.geocode_waypoints (result_id)",
    r#"
    CREATE TABLE IF NOT EXISTS analytics.consolidated_geocodes (
        result_id UUID PRIMARY KEY,
        source_record_id BIGINT NOT NULL,
        formatted_address TEXT NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        location_type TEXT,
        place_id TEXT,
        component_names TEXT NOT NULL DEFAULT '',
        type_tags TEXT NOT NULL DEFAULT '',
        waypoint_count BIGINT NOT NULL DEFAULT 0,
        waypoint_list TEXT NOT NULL DEFAULT '',
        consolidated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Create schemas and tables if they do not exist.
pub async fn initialize_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(statements = SCHEMA_STATEMENTS.len(), "schema bootstrap complete");
    Ok(())
}
