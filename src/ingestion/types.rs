//! Ingestion run types.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ephemeral summary of one batch invocation. Reported to the caller and
/// the log; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRunOutcome {
    /// Records selected and attempted in this invocation
    pub attempted: usize,
    /// Records geocoded and durably staged
    pub succeeded: usize,
    /// Records whose attempt failed (geocode or staging write)
    pub failed: usize,
    /// Identifiers of failed records, for operator follow-up
    pub failed_ids: Vec<i64>,
    /// Watermark value after this invocation
    pub watermark: i64,
}

impl BatchRunOutcome {
    /// Outcome of an empty selection: zero counts, watermark untouched.
    pub fn no_op(watermark: i64) -> Self {
        Self {
            watermark,
            ..Self::default()
        }
    }

    /// Fold another batch outcome into a running total.
    pub fn absorb(&mut self, other: &BatchRunOutcome) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.failed_ids.extend_from_slice(&other.failed_ids);
        self.watermark = self.watermark.max(other.watermark);
    }
}

/// Cooperative cancellation flag, checked between record attempts.
///
/// Cancellation never writes a partial watermark: the in-flight batch stops
/// before its next record attempt and returns without committing. Staging
/// rows already flushed remain, which is safe under at-least-once delivery.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_accumulates_counts_and_keeps_highest_watermark() {
        let mut total = BatchRunOutcome::no_op(5);
        total.absorb(&BatchRunOutcome {
            attempted: 3,
            succeeded: 2,
            failed: 1,
            failed_ids: vec![7],
            watermark: 8,
        });
        total.absorb(&BatchRunOutcome::no_op(8));

        assert_eq!(total.attempted, 3);
        assert_eq!(total.succeeded, 2);
        assert_eq!(total.failed, 1);
        assert_eq!(total.failed_ids, vec![7]);
        assert_eq!(total.watermark, 8);
    }

    #[test]
    fn token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
