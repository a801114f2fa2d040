//! Consolidation semantics: deduplication, coordinate validation, child
//! collection flattening, and the data checks guarding the clean layer.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use geoflow_core::consolidation::{
    check_coordinate_ranges, check_unique_result_ids, consolidate, ConsolidationStep,
    RejectionReason, StagingConsolidation,
};
use geoflow_core::ingestion::{InMemoryStagingStore, StagingStore};
use geoflow_core::models::{AddressComponent, GeocodeResult, Waypoint};

fn raw_row(source_record_id: i64, latitude: f64, longitude: f64) -> GeocodeResult {
    GeocodeResult {
        result_id: Uuid::new_v4(),
        source_record_id,
        formatted_address: format!("address {source_record_id}"),
        latitude: Some(latitude),
        longitude: Some(longitude),
        location_type: Some("ROOFTOP".to_string()),
        place_id: Some(format!("place-{source_record_id}")),
        components: vec![],
        types: vec![],
        waypoints: vec![],
        ingested_at: Utc::now(),
    }
}

#[test]
fn duplicate_result_ids_consolidate_to_one_row() {
    let first = raw_row(1, 18.3, 105.9);
    let duplicate = first.clone();

    let report = consolidate(&[first, duplicate]);

    assert_eq!(report.rows.len(), 1);
    assert!(report.rejected.is_empty());
    assert!(check_unique_result_ids(&report.rows).is_empty());
}

#[test]
fn reattempts_for_one_source_record_keep_the_latest_row() {
    let mut early = raw_row(7, 18.0, 105.0);
    early.ingested_at = Utc::now() - Duration::minutes(5);
    let late = raw_row(7, 18.5, 105.5);

    let report = consolidate(&[early, late.clone()]);

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].result_id, late.result_id);
    assert_eq!(report.rows[0].latitude, 18.5);
}

#[test]
fn out_of_range_latitude_is_rejected_and_flagged() {
    let valid = raw_row(1, 18.3, 105.9);
    let invalid = raw_row(2, 95.0, 105.9);
    let invalid_id = invalid.result_id;

    let report = consolidate(&[valid, invalid.clone()]);

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].source_record_id, 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].result_id, invalid_id);
    assert_eq!(report.rejected[0].reason, RejectionReason::LatitudeOutOfRange(95.0));

    let flagged = check_coordinate_ranges(&[invalid]);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].source_record_id, 2);
}

#[test]
fn null_coordinates_never_reach_the_consolidated_view() {
    let mut missing = raw_row(3, 0.0, 0.0);
    missing.latitude = None;
    missing.longitude = None;

    let report = consolidate(&[missing]);

    assert!(report.rows.is_empty());
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, RejectionReason::MissingCoordinates);
}

#[test]
fn longitude_bounds_are_enforced() {
    let west_of_everything = raw_row(4, 10.0, -181.0);
    let report = consolidate(&[west_of_everything]);

    assert!(report.rows.is_empty());
    assert_eq!(
        report.rejected[0].reason,
        RejectionReason::LongitudeOutOfRange(-181.0)
    );
}

#[test]
fn child_collections_flatten_into_aggregated_fields() {
    let mut row = raw_row(5, 18.342, 105.905);
    row.components = vec![
        AddressComponent {
            long_name: "Thành Sen".to_string(),
            short_name: Some("TS".to_string()),
            types: vec!["ward".to_string()],
        },
        AddressComponent {
            long_name: "Hà Tĩnh".to_string(),
            short_name: None,
            types: vec!["province".to_string()],
        },
        // Duplicate long name collapses in the aggregate.
        AddressComponent {
            long_name: "Hà Tĩnh".to_string(),
            short_name: None,
            types: vec!["administrative".to_string()],
        },
    ];
    row.types = vec![
        "ward".to_string(),
        "political".to_string(),
        "ward".to_string(),
    ];
    row.waypoints = vec![
        Waypoint {
            latitude: 18.342_123_456_7,
            longitude: 105.905_432_1,
        },
        Waypoint {
            latitude: 18.35,
            longitude: 105.91,
        },
    ];

    let report = consolidate(&[row]);
    let consolidated = &report.rows[0];

    assert_eq!(consolidated.component_names, "Hà Tĩnh, Thành Sen");
    assert_eq!(consolidated.type_tags, "political, ward");
    assert_eq!(consolidated.waypoint_count, 2);
    assert_eq!(
        consolidated.waypoint_list,
        "(18.342123, 105.905432); (18.350000, 105.910000)"
    );
}

#[test]
fn uniqueness_check_detects_duplicates() {
    let row = raw_row(1, 18.3, 105.9);
    let report = consolidate(&[row]);
    let mut rows = report.rows.clone();
    rows.push(rows[0].clone());

    let duplicates = check_unique_result_ids(&rows);
    assert_eq!(duplicates, vec![rows[0].result_id]);
}

#[tokio::test]
async fn staging_consolidation_step_reports_counts() {
    let staging = Arc::new(InMemoryStagingStore::new());
    staging.append(&raw_row(1, 18.3, 105.9)).await.unwrap();
    staging.append(&raw_row(2, 95.0, 105.9)).await.unwrap();
    staging.append(&raw_row(3, 18.4, 106.0)).await.unwrap();

    let step = StagingConsolidation::new(staging);
    let outcome = step.run().await.unwrap();

    assert_eq!(outcome.consolidated, 2);
    assert_eq!(outcome.rejected, 1);

    let report = step.latest_report().expect("report retained");
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rejected.len(), 1);
}
