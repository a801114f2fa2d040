//! # Data Models
//!
//! Data layer for the ingestion pipeline. Models own their SQL: each type
//! exposes the queries that read and write it, and higher-level components
//! (stores, checkpointer, web handlers) call through these functions rather
//! than embedding SQL of their own.

pub mod core;

pub use self::core::geocode_result::{AddressComponent, GeocodeResult, Waypoint};
pub use self::core::ingestion_state::IngestionState;
pub use self::core::source_record::{NewSourceRecord, SourceRecord};
