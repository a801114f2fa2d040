//! # Pipeline
//!
//! The orchestration surface: an explicit two-step ordered pipeline rather
//! than a general-purpose scheduler. Step 1 drains checkpointed ingestion;
//! step 2 rebuilds the consolidated view, gated on step 1 completing
//! successfully. The two steps never run concurrently for the same target:
//! a run holds the pipeline lock end to end, and a second concurrent
//! invocation is rejected with a typed error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::consolidation::{ConsolidationOutcome, ConsolidationStep};
use crate::error::{GeoflowError, Result};
use crate::ingestion::{BatchRunOutcome, CancellationToken, Checkpointer};

/// Summary of one full pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunOutcome {
    pub ingestion: BatchRunOutcome,
    pub consolidation: ConsolidationOutcome,
}

/// Ordered two-step pipeline: ingest, then consolidate.
pub struct Pipeline {
    checkpointer: Arc<Checkpointer>,
    consolidation: Arc<dyn ConsolidationStep>,
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(checkpointer: Arc<Checkpointer>, consolidation: Arc<dyn ConsolidationStep>) -> Self {
        Self {
            checkpointer,
            consolidation,
            run_lock: Mutex::new(()),
        }
    }

    /// Run both steps once: drain ingestion, then consolidate.
    ///
    /// Consolidation is gated on ingestion completing; an ingestion error
    /// (including cancellation) leaves the consolidated view untouched.
    #[instrument(skip(self, token))]
    pub async fn run(&self, token: &CancellationToken) -> Result<PipelineRunOutcome> {
        let _guard = self.run_lock.try_lock().map_err(|_| {
            GeoflowError::ConcurrentInvocation {
                key: self.checkpointer.config().watermark_key.clone(),
            }
        })?;

        let batch_size = self.checkpointer.config().default_batch_size;
        info!(batch_size, "pipeline run starting: step 1 of 2 (ingestion)");

        let ingestion = match self.checkpointer.run_to_completion(batch_size, token).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = %error, "ingestion step failed; consolidation not started");
                return Err(error);
            }
        };

        info!(
            attempted = ingestion.attempted,
            watermark = ingestion.watermark,
            "pipeline step 2 of 2 (consolidation)"
        );
        let consolidation = self.consolidation.run().await?;

        info!(
            succeeded = ingestion.succeeded,
            failed = ingestion.failed,
            consolidated = consolidation.consolidated,
            rejected = consolidation.rejected,
            "pipeline run complete"
        );

        Ok(PipelineRunOutcome {
            ingestion,
            consolidation,
        })
    }
}
