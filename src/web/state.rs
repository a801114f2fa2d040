//! Web application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::ingestion::SourceRecordStore;

/// Shared state for the import API.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn SourceRecordStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(records: Arc<dyn SourceRecordStore>) -> Self {
        Self {
            records,
            started_at: Utc::now(),
        }
    }
}
