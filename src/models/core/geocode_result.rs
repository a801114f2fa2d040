//! # Geocode Result Model
//!
//! Raw geocoding output staged per successful record attempt.
//!
//! ## Overview
//!
//! Each successfully geocoded [`SourceRecord`](super::source_record::SourceRecord)
//! produces one `GeocodeResult`, keyed by an opaque per-call identifier.
//! Repeated substructures (address components, type tags, navigation
//! waypoints) live in parent-linked child tables.
//!
//! Staging delivery is **at-least-once**: a crash between staging writes and
//! the watermark commit means the next run re-attempts the same records, so
//! duplicates for one source record are expected here and deduplicated by
//! the consolidation step. Coordinates are nullable in staging; range
//! enforcement happens at the consolidation boundary.
//!
//! ## Database Schema
//!
//! Parent table `staging.geocode_results`, children
//! `staging.geocode_address_components`, `staging.geocode_result_types`,
//! `staging.geocode_waypoints`, each keyed by `result_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

/// One element of a structured address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: Option<String>,
    pub types: Vec<String>,
}

/// A navigation waypoint coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw geocoding output for one source record attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Opaque per-call identifier assigned at staging time.
    pub result_id: Uuid,
    pub source_record_id: i64,
    pub formatted_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub place_id: Option<String>,
    pub components: Vec<AddressComponent>,
    pub types: Vec<String>,
    pub waypoints: Vec<Waypoint>,
    pub ingested_at: DateTime<Utc>,
}

/// Flat parent row, as stored.
#[derive(Debug, Clone, FromRow)]
struct GeocodeResultRow {
    result_id: Uuid,
    source_record_id: i64,
    formatted_address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_type: Option<String>,
    place_id: Option<String>,
    ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct AddressComponentRow {
    result_id: Uuid,
    long_name: String,
    short_name: Option<String>,
    types: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
struct TypeTagRow {
    result_id: Uuid,
    type_tag: String,
}

#[derive(Debug, Clone, FromRow)]
struct WaypointRow {
    result_id: Uuid,
    latitude: f64,
    longitude: f64,
}

impl GeocodeResult {
    /// Build a staged result from a geocoding payload, assigning a fresh
    /// per-call identifier.
    pub fn from_payload(source_record_id: i64, payload: crate::geocoder::GeocodePayload) -> Self {
        Self {
            result_id: Uuid::new_v4(),
            source_record_id,
            formatted_address: payload.formatted_address,
            latitude: Some(payload.latitude),
            longitude: Some(payload.longitude),
            location_type: payload.location_type,
            place_id: payload.place_id,
            components: payload.components,
            types: payload.types,
            waypoints: payload.waypoints,
            ingested_at: Utc::now(),
        }
    }

    /// Insert the result and its child collections in one transaction.
    pub async fn insert(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO staging.geocode_results (
                result_id, source_record_id, formatted_address, latitude, longitude,
                location_type, place_id, ingested_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(self.result_id)
        .bind(self.source_record_id)
        .bind(&self.formatted_address)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.location_type)
        .bind(&self.place_id)
        .bind(self.ingested_at)
        .execute(&mut *tx)
        .await?;

        for component in &self.components {
            sqlx::query(
                r#"
                INSERT INTO staging.geocode_address_components (result_id, long_name, short_name, types)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(self.result_id)
            .bind(&component.long_name)
            .bind(&component.short_name)
            .bind(&component.types)
            .execute(&mut *tx)
            .await?;
        }

        for type_tag in &self.types {
            sqlx::query(
                r#"
                INSERT INTO staging.geocode_result_types (result_id, type_tag)
                VALUES ($1, $2)
                "#,
            )
            .bind(self.result_id)
            .bind(type_tag)
            .execute(&mut *tx)
            .await?;
        }

        for (position, waypoint) in self.waypoints.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO staging.geocode_waypoints (result_id, latitude, longitude, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(self.result_id)
            .bind(waypoint.latitude)
            .bind(waypoint.longitude)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Fetch all staged results with their child collections hydrated.
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<GeocodeResult>, sqlx::Error> {
        let parents = sqlx::query_as::<_, GeocodeResultRow>(
            r#"
            SELECT result_id, source_record_id, formatted_address, latitude, longitude,
                   location_type, place_id, ingested_at
            FROM staging.geocode_results
            ORDER BY ingested_at, result_id
            "#,
        )
        .fetch_all(pool);

        let child_components = sqlx::query_as::<_, AddressComponentRow>(
            "SELECT result_id, long_name, short_name, types FROM staging.geocode_address_components ORDER BY id",
        )
        .fetch_all(pool);

        let child_tags = sqlx::query_as::<_, TypeTagRow>(
            "SELECT result_id, type_tag FROM staging.geocode_result_types ORDER BY id",
        )
        .fetch_all(pool);

        let child_waypoints = sqlx::query_as::<_, WaypointRow>(
            "SELECT result_id, latitude, longitude FROM staging.geocode_waypoints ORDER BY result_id, position",
        )
        .fetch_all(pool);

        let (rows, components, type_tags, waypoints) =
            futures::try_join!(parents, child_components, child_tags, child_waypoints)?;

        let mut components_by_result: HashMap<Uuid, Vec<AddressComponent>> = HashMap::new();
        for row in components {
            components_by_result
                .entry(row.result_id)
                .or_default()
                .push(AddressComponent {
                    long_name: row.long_name,
                    short_name: row.short_name,
                    types: row.types,
                });
        }

        let mut tags_by_result: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in type_tags {
            tags_by_result.entry(row.result_id).or_default().push(row.type_tag);
        }

        let mut waypoints_by_result: HashMap<Uuid, Vec<Waypoint>> = HashMap::new();
        for row in waypoints {
            waypoints_by_result
                .entry(row.result_id)
                .or_default()
                .push(Waypoint {
                    latitude: row.latitude,
                    longitude: row.longitude,
                });
        }

        // Duplicate parent rows can share a result_id under at-least-once
        // delivery, so child lookups clone rather than consume.
        Ok(rows
            .into_iter()
            .map(|row| GeocodeResult {
                components: components_by_result.get(&row.result_id).cloned().unwrap_or_default(),
                types: tags_by_result.get(&row.result_id).cloned().unwrap_or_default(),
                waypoints: waypoints_by_result.get(&row.result_id).cloned().unwrap_or_default(),
                result_id: row.result_id,
                source_record_id: row.source_record_id,
                formatted_address: row.formatted_address,
                latitude: row.latitude,
                longitude: row.longitude,
                location_type: row.location_type,
                place_id: row.place_id,
                ingested_at: row.ingested_at,
            })
            .collect())
    }
}
