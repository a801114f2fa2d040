//! # Error Types
//!
//! Structured error handling for the ingestion pipeline using thiserror.
//!
//! The taxonomy mirrors the failure policy of the checkpointer: transient
//! geocoding failures and staging-write failures are scoped to a single
//! record and never abort a batch, while a watermark commit failure is fatal
//! to the whole batch and records no progress.

use crate::geocoder::GeocodeError;
use thiserror::Error;

/// Pipeline-wide error type.
#[derive(Error, Debug)]
pub enum GeoflowError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Geocoding failed for record {record_id}: {source}")]
    Geocode {
        record_id: i64,
        #[source]
        source: GeocodeError,
    },

    #[error("Staging write failed for record {record_id}: {message}")]
    StagingWrite { record_id: i64, message: String },

    #[error("Watermark commit to {value} failed: {message}")]
    WatermarkCommit { value: i64, message: String },

    #[error("Concurrent batch invocation rejected for watermark resource '{key}'")]
    ConcurrentInvocation { key: String },

    #[error("Batch cancelled after attempting {attempted} of {selected} selected records")]
    Cancelled { attempted: usize, selected: usize },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl GeoflowError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a database error with operation context
    pub fn database(operation: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Database {
            operation: operation.into(),
            message: source.to_string(),
        }
    }

    /// Create a staging-write error scoped to one record
    pub fn staging_write(record_id: i64, source: impl std::fmt::Display) -> Self {
        Self::StagingWrite {
            record_id,
            message: source.to_string(),
        }
    }

    /// Create a watermark commit error
    pub fn watermark_commit(value: i64, source: impl std::fmt::Display) -> Self {
        Self::WatermarkCommit {
            value,
            message: source.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True when the error is scoped to a single record attempt and the
    /// batch may continue past it.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, Self::Geocode { .. } | Self::StagingWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, GeoflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_scoped_errors_do_not_abort_batches() {
        let staging = GeoflowError::staging_write(7, "disk full");
        assert!(staging.is_record_scoped());

        let watermark = GeoflowError::watermark_commit(7, "connection reset");
        assert!(!watermark.is_record_scoped());
    }

    #[test]
    fn display_includes_context() {
        let err = GeoflowError::database("fetch_unprocessed", "timed out");
        assert_eq!(err.to_string(), "Database error: fetch_unprocessed: timed out");
    }
}
