//! # Database Operations
//!
//! Connection pooling and schema bootstrap for the pipeline's PostgreSQL
//! backing store.

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::initialize_schema;
