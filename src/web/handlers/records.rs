//! # Record Import Handlers
//!
//! HTTP handlers for appending and reading source records. Two import
//! shapes are supported: a JSON array of structured records, and a single
//! comma-separated text payload for quick bulk entry.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{NewSourceRecord, SourceRecord};
use crate::web::response_types::{ApiError, ApiResult};
use crate::web::state::AppState;

/// One record in a structured import request.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordImportRequest {
    pub name: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Comma-separated bulk import request.
#[derive(Debug, Clone, Deserialize)]
pub struct TextImportRequest {
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: &'static str,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct TextImportResponse {
    pub message: &'static str,
    pub total_imported: usize,
    pub records: Vec<ImportedRecord>,
}

#[derive(Debug, Serialize)]
pub struct ImportedRecord {
    pub id: i64,
    pub name: String,
}

/// Append a JSON array of records.
pub async fn import_records(
    State(state): State<AppState>,
    Json(requests): Json<Vec<RecordImportRequest>>,
) -> ApiResult<Json<ImportResponse>> {
    if requests.iter().any(|r| r.name.trim().is_empty()) {
        return Err(ApiError::bad_request("record name must not be empty"));
    }

    let new_records: Vec<NewSourceRecord> = requests
        .into_iter()
        .map(|r| NewSourceRecord {
            name: r.name,
            district: r.district,
            city: r.city,
        })
        .collect();

    let created = state.records.append(new_records).await?;
    info!(total = created.len(), "imported source records");

    Ok(Json(ImportResponse {
        message: "Import records successfully",
        total: created.len(),
    }))
}

/// Append records from a comma-separated name list. Blank entries are
/// skipped.
pub async fn import_records_text(
    State(state): State<AppState>,
    Json(payload): Json<TextImportRequest>,
) -> ApiResult<Json<TextImportResponse>> {
    let new_records: Vec<NewSourceRecord> = payload
        .data
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| NewSourceRecord {
            name: name.to_string(),
            district: None,
            city: None,
        })
        .collect();

    let created = state.records.append(new_records).await?;
    info!(total = created.len(), "imported source records from text");

    Ok(Json(TextImportResponse {
        message: "Import records from text successfully",
        total_imported: created.len(),
        records: created
            .into_iter()
            .map(|r| ImportedRecord { id: r.id, name: r.name })
            .collect(),
    }))
}

/// List all records in identifier order.
pub async fn list_records(State(state): State<AppState>) -> ApiResult<Json<Vec<SourceRecord>>> {
    let records = state.records.list().await?;
    Ok(Json(records))
}

/// Look up one record by identifier.
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SourceRecord>> {
    match state.records.find_by_id(id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::InMemorySourceRecordStore;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(InMemorySourceRecordStore::new()))
    }

    #[tokio::test]
    async fn import_assigns_ascending_identifiers() {
        let state = state();

        let response = import_records(
            State(state.clone()),
            Json(vec![
                RecordImportRequest {
                    name: "Thành Sen".to_string(),
                    district: Some("Trần Phú".to_string()),
                    city: None,
                },
                RecordImportRequest {
                    name: "Cẩm Bình".to_string(),
                    district: None,
                    city: None,
                },
            ]),
        )
        .await
        .unwrap();

        assert_eq!(response.0.total, 2);

        let listed = list_records(State(state)).await.unwrap();
        let ids: Vec<i64> = listed.0.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn import_rejects_blank_names() {
        let result = import_records(
            State(state()),
            Json(vec![RecordImportRequest {
                name: "   ".to_string(),
                district: None,
                city: None,
            }]),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn text_import_skips_blank_entries() {
        let state = state();

        let response = import_records_text(
            State(state.clone()),
            Json(TextImportRequest {
                data: "Thành Sen, , Thạch Khê,  Đồng Tiến ".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.total_imported, 3);
        let names: Vec<&str> = response.0.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Thành Sen", "Thạch Khê", "Đồng Tiến"]);
    }

    #[tokio::test]
    async fn get_record_returns_not_found_for_missing_id() {
        let result = get_record(State(state()), Path(42)).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }
}
