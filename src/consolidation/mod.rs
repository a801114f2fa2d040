//! # Consolidation
//!
//! Produces one clean row per distinct geocode result from the raw staging
//! layer, and the data checks that guard it.
//!
//! ## Overview
//!
//! Staging delivery is at-least-once, so raw rows may be duplicated — both
//! exact duplicates sharing a result identifier and re-attempts of the same
//! source record under fresh identifiers. Consolidation:
//!
//! 1. deduplicates by result identifier (first occurrence wins),
//! 2. rejects rows with null or out-of-range coordinates,
//! 3. keeps the latest remaining row per source record,
//! 4. flattens child collections into aggregated text fields and a
//!    formatted waypoint list rounded to 6 decimal digits.
//!
//! The data checks mirror the warehouse-side test suite: uniqueness of the
//! result identifier in the output and coordinate range validation over the
//! raw input.

pub mod postgres;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::constants::{LATITUDE_RANGE, LONGITUDE_RANGE, WAYPOINT_DECIMAL_DIGITS};
use crate::error::Result;
use crate::ingestion::StagingStore;
use crate::models::GeocodeResult;

pub use postgres::PostgresConsolidation;

/// One consolidated row: a distinct, validated geocode result with child
/// collections flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedGeocode {
    pub result_id: Uuid,
    pub source_record_id: i64,
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: Option<String>,
    pub place_id: Option<String>,
    /// Comma-joined distinct address-component long names
    pub component_names: String,
    /// Comma-joined distinct type tags
    pub type_tags: String,
    pub waypoint_count: usize,
    /// Waypoint coordinate pairs, 6 decimal digits, semicolon-separated
    pub waypoint_list: String,
}

/// Why a raw row was kept out of the consolidated view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectionReason {
    #[error("coordinates are missing")]
    MissingCoordinates,
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A raw row flagged at the consolidation boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedResult {
    pub result_id: Uuid,
    pub source_record_id: i64,
    pub reason: RejectionReason,
}

/// Output of one consolidation pass.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    pub rows: Vec<ConsolidatedGeocode>,
    pub rejected: Vec<RejectedResult>,
}

/// Aggregate counts reported to the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationOutcome {
    pub consolidated: usize,
    pub rejected: usize,
}

/// Validate a raw row's coordinate pair.
pub fn validate_coordinates(result: &GeocodeResult) -> std::result::Result<(f64, f64), RejectionReason> {
    let (latitude, longitude) = match (result.latitude, result.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(RejectionReason::MissingCoordinates),
    };

    if !latitude.is_finite() || latitude < LATITUDE_RANGE.0 || latitude > LATITUDE_RANGE.1 {
        return Err(RejectionReason::LatitudeOutOfRange(latitude));
    }
    if !longitude.is_finite() || longitude < LONGITUDE_RANGE.0 || longitude > LONGITUDE_RANGE.1 {
        return Err(RejectionReason::LongitudeOutOfRange(longitude));
    }

    Ok((latitude, longitude))
}

/// Consolidate raw staged rows into one row per distinct result identifier.
pub fn consolidate(raw: &[GeocodeResult]) -> ConsolidationReport {
    let mut report = ConsolidationReport::default();

    // Pass 1: collapse exact duplicates sharing a result identifier.
    let mut seen_ids: HashSet<Uuid> = HashSet::new();
    let mut distinct: Vec<&GeocodeResult> = Vec::new();
    for row in raw {
        if seen_ids.insert(row.result_id) {
            distinct.push(row);
        }
    }

    // Pass 2: reject invalid coordinates, keep the latest valid row per
    // source record (re-attempts supersede crashed-run leftovers).
    let mut latest_valid: HashMap<i64, (&GeocodeResult, f64, f64)> = HashMap::new();
    for row in distinct {
        match validate_coordinates(row) {
            Ok((latitude, longitude)) => {
                let keep = match latest_valid.get(&row.source_record_id) {
                    Some((current, _, _)) => row.ingested_at >= current.ingested_at,
                    None => true,
                };
                if keep {
                    latest_valid.insert(row.source_record_id, (row, latitude, longitude));
                }
            }
            Err(reason) => report.rejected.push(RejectedResult {
                result_id: row.result_id,
                source_record_id: row.source_record_id,
                reason,
            }),
        }
    }

    let mut rows: Vec<ConsolidatedGeocode> = latest_valid
        .into_values()
        .map(|(row, latitude, longitude)| ConsolidatedGeocode {
            result_id: row.result_id,
            source_record_id: row.source_record_id,
            formatted_address: row.formatted_address.clone(),
            latitude,
            longitude,
            location_type: row.location_type.clone(),
            place_id: row.place_id.clone(),
            component_names: joined_distinct(row.components.iter().map(|c| c.long_name.as_str())),
            type_tags: joined_distinct(row.types.iter().map(String::as_str)),
            waypoint_count: row.waypoints.len(),
            waypoint_list: format_waypoints(row),
        })
        .collect();
    rows.sort_by_key(|row| row.source_record_id);
    report.rejected.sort_by_key(|r| r.source_record_id);
    report.rows = rows;
    report
}

fn joined_distinct<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let distinct: BTreeSet<&str> = values.collect();
    distinct.into_iter().collect::<Vec<_>>().join(", ")
}

fn format_waypoints(row: &GeocodeResult) -> String {
    row.waypoints
        .iter()
        .map(|w| {
            format!(
                "({:.digits$}, {:.digits$})",
                w.latitude,
                w.longitude,
                digits = WAYPOINT_DECIMAL_DIGITS
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Data check: result identifiers appearing more than once in the output.
pub fn check_unique_result_ids(rows: &[ConsolidatedGeocode]) -> Vec<Uuid> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.result_id).or_insert(0) += 1;
    }
    let mut duplicates: Vec<Uuid> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    duplicates.sort();
    duplicates
}

/// Data check: raw rows whose coordinates are null or out of range.
pub fn check_coordinate_ranges(raw: &[GeocodeResult]) -> Vec<RejectedResult> {
    raw.iter()
        .filter_map(|row| {
            validate_coordinates(row).err().map(|reason| RejectedResult {
                result_id: row.result_id,
                source_record_id: row.source_record_id,
                reason,
            })
        })
        .collect()
}

/// The pipeline's second step: consolidate whatever the staging store holds.
#[async_trait]
pub trait ConsolidationStep: Send + Sync {
    async fn run(&self) -> Result<ConsolidationOutcome>;
}

/// Consolidation over a [`StagingStore`] seam, keeping the full report in
/// memory for inspection.
pub struct StagingConsolidation {
    staging: Arc<dyn StagingStore>,
    latest: Mutex<Option<ConsolidationReport>>,
}

impl StagingConsolidation {
    pub fn new(staging: Arc<dyn StagingStore>) -> Self {
        Self {
            staging,
            latest: Mutex::new(None),
        }
    }

    /// The report from the most recent run, if any.
    pub fn latest_report(&self) -> Option<ConsolidationReport> {
        self.latest.lock().clone()
    }
}

#[async_trait]
impl ConsolidationStep for StagingConsolidation {
    #[instrument(skip(self))]
    async fn run(&self) -> Result<ConsolidationOutcome> {
        let raw = self.staging.fetch_all().await?;
        let report = consolidate(&raw);
        let outcome = ConsolidationOutcome {
            consolidated: report.rows.len(),
            rejected: report.rejected.len(),
        };

        info!(
            raw = raw.len(),
            consolidated = outcome.consolidated,
            rejected = outcome.rejected,
            "consolidation pass complete"
        );

        *self.latest.lock() = Some(report);
        Ok(outcome)
    }
}
