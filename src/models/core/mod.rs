//! Core entity models.

pub mod geocode_result;
pub mod ingestion_state;
pub mod source_record;
