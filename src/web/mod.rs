//! # Record Import API
//!
//! HTTP surface for appending source records ahead of ingestion. Import
//! endpoints append only: existing identifiers are never mutated or
//! reordered, which the checkpointer's contiguous-prefix watermark relies
//! on.

pub mod handlers;
pub mod response_types;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use response_types::{ApiError, ApiResult};
pub use state::AppState;

/// Build the import API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/records/import", post(handlers::records::import_records))
        .route("/records/import-text", post(handlers::records::import_records_text))
        .route("/records", get(handlers::records::list_records))
        .route("/records/:id", get(handlers::records::get_record))
        .route("/health", get(handlers::health::health))
        .with_state(state)
}
