//! # Incremental Ingestion
//!
//! Checkpointed, batch-bounded ingestion of source records through the
//! geocoding service into the staging store.
//!
//! ## Core Components
//!
//! - **[`Checkpointer`]**: owns the watermark and drives batches with
//!   failure isolation and a single batch-level watermark commit
//! - **Store seams**: [`SourceRecordStore`], [`WatermarkStore`],
//!   [`StagingStore`] decouple the checkpointer from its backing storage
//! - **Backends**: Postgres implementations for production, in-memory
//!   implementations for tests and local runs

pub mod checkpointer;
pub mod memory;
pub mod postgres;
pub mod stores;
pub mod types;

pub use checkpointer::{Checkpointer, CheckpointerConfig};
pub use memory::{InMemorySourceRecordStore, InMemoryStagingStore, InMemoryWatermarkStore};
pub use postgres::{PostgresSourceRecordStore, PostgresStagingStore, PostgresWatermarkStore};
pub use stores::{SourceRecordStore, StagingStore, WatermarkStore};
pub use types::{BatchRunOutcome, CancellationToken};
