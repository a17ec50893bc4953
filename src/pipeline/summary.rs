//! Batch-level aggregation of scored transactions.

use crate::error::{PipelineError, PipelineResult};
use crate::types::ScoredTransaction;
use serde::Serialize;
use std::fmt;

/// Outcome counts for one scored batch.
///
/// Only counts are stored; the percentage is derived from them on request.
/// Built only by [`summarize`], so `total` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Transactions processed
    total: usize,
    /// Transactions the model labelled as fraud
    fraud_count: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn fraud_count(&self) -> usize {
        self.fraud_count
    }

    /// Share of transactions labelled as fraud, in percent.
    pub fn fraud_percent(&self) -> f64 {
        100.0 * self.fraud_count as f64 / self.total as f64
    }

    pub fn legitimate_count(&self) -> usize {
        self.total - self.fraud_count
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transactions processed, {} classified as fraud ({:.2}%)",
            self.total,
            self.fraud_count,
            self.fraud_percent()
        )
    }
}

/// Recompute the summary from the scored rows.
///
/// An empty sequence has no defined fraud percentage and is rejected.
pub fn summarize(transactions: &[ScoredTransaction]) -> PipelineResult<BatchSummary> {
    if transactions.is_empty() {
        return Err(PipelineError::EmptyBatch);
    }

    Ok(BatchSummary {
        total: transactions.len(),
        fraud_count: transactions.iter().filter(|tx| tx.is_fraud()).count(),
    })
}
