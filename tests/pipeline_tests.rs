//! Pipeline behavior: the end-to-end scenario, the consolidation gate, and
//! run serialization.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::{BlockingGeocoder, FailOnceWatermarkStore, ScriptedGeocoder};
use geoflow_core::consolidation::{ConsolidationOutcome, ConsolidationStep, StagingConsolidation};
use geoflow_core::error::{GeoflowError, Result};
use geoflow_core::ingestion::{
    CancellationToken, Checkpointer, InMemorySourceRecordStore, InMemoryStagingStore,
    InMemoryWatermarkStore,
};
use geoflow_core::pipeline::Pipeline;

/// Consolidation step that only counts invocations, for gate assertions.
#[derive(Default)]
struct CountingConsolidation {
    runs: AtomicUsize,
}

impl CountingConsolidation {
    fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsolidationStep for CountingConsolidation {
    async fn run(&self) -> Result<ConsolidationOutcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(ConsolidationOutcome::default())
    }
}

#[tokio::test]
async fn end_to_end_scenario_matches_expected_counts() {
    // Seed records 1..3, fail geocoding for id 2 only.
    let source = Arc::new(InMemorySourceRecordStore::new());
    source.seed(&["ward 1", "ward 2", "ward 3"]);

    let staging = Arc::new(InMemoryStagingStore::new());
    let checkpointer = Arc::new(Checkpointer::new(
        source,
        Arc::new(InMemoryWatermarkStore::new()),
        staging.clone(),
        Arc::new(ScriptedGeocoder::failing_for(&["ward 2"])),
    ));
    let consolidation = Arc::new(StagingConsolidation::new(staging.clone()));
    let pipeline = Pipeline::new(checkpointer, consolidation.clone());

    let outcome = pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.ingestion.attempted, 3);
    assert_eq!(outcome.ingestion.succeeded, 2);
    assert_eq!(outcome.ingestion.failed, 1);
    assert_eq!(outcome.ingestion.failed_ids, vec![2]);
    assert_eq!(outcome.ingestion.watermark, 3);

    // Exactly two geocode results persisted, both consolidated.
    assert_eq!(staging.len(), 2);
    assert_eq!(outcome.consolidation.consolidated, 2);
    assert_eq!(outcome.consolidation.rejected, 0);

    let report = consolidation.latest_report().expect("report retained");
    let ids: Vec<i64> = report.rows.iter().map(|r| r.source_record_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn consolidation_is_gated_on_ingestion_success() {
    let source = Arc::new(InMemorySourceRecordStore::new());
    source.seed(&["ward 1"]);

    let checkpointer = Arc::new(Checkpointer::new(
        source,
        Arc::new(FailOnceWatermarkStore::failing(usize::MAX)),
        Arc::new(InMemoryStagingStore::new()),
        Arc::new(ScriptedGeocoder::succeeding()),
    ));
    let consolidation = Arc::new(CountingConsolidation::default());
    let pipeline = Pipeline::new(checkpointer, consolidation.clone());

    let result = pipeline.run(&CancellationToken::new()).await;

    assert!(matches!(result, Err(GeoflowError::WatermarkCommit { .. })));
    assert_eq!(consolidation.run_count(), 0, "step 2 must not run after step 1 fails");
}

#[tokio::test]
async fn cancelled_ingestion_skips_consolidation() {
    let source = Arc::new(InMemorySourceRecordStore::new());
    source.seed(&["ward 1", "ward 2"]);

    let token = CancellationToken::new();
    token.cancel();

    let checkpointer = Arc::new(Checkpointer::new(
        source,
        Arc::new(InMemoryWatermarkStore::new()),
        Arc::new(InMemoryStagingStore::new()),
        Arc::new(ScriptedGeocoder::succeeding()),
    ));
    let consolidation = Arc::new(CountingConsolidation::default());
    let pipeline = Pipeline::new(checkpointer, consolidation.clone());

    let result = pipeline.run(&token).await;

    assert!(matches!(result, Err(GeoflowError::Cancelled { .. })));
    assert_eq!(consolidation.run_count(), 0);
}

#[tokio::test]
async fn concurrent_pipeline_runs_are_rejected() {
    let source = Arc::new(InMemorySourceRecordStore::new());
    source.seed(&["ward 1"]);

    let geocoder = Arc::new(BlockingGeocoder::new());
    let started = geocoder.started();

    let checkpointer = Arc::new(Checkpointer::new(
        source,
        Arc::new(InMemoryWatermarkStore::new()),
        Arc::new(InMemoryStagingStore::new()),
        geocoder.clone(),
    ));
    let pipeline = Arc::new(Pipeline::new(
        checkpointer,
        Arc::new(CountingConsolidation::default()),
    ));

    let first_pipeline = Arc::clone(&pipeline);
    let first = tokio::spawn(async move { first_pipeline.run(&CancellationToken::new()).await });

    started.notified().await;

    let second = pipeline.run(&CancellationToken::new()).await;
    assert!(matches!(second, Err(GeoflowError::ConcurrentInvocation { .. })));

    geocoder.release_all(4);
    let first_outcome = first.await.unwrap().unwrap();
    assert_eq!(first_outcome.ingestion.attempted, 1);
    assert_eq!(first_outcome.ingestion.watermark, 1);
}
