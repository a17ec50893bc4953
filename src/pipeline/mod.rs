//! Transaction scoring pipeline.
//!
//! raw batch → validator → aligner → scorer → annotator → summary / export.
//! Each stage either completes for the whole batch or fails the run; a
//! validation failure always stops the run before the model is invoked.

pub mod aligner;
pub mod annotator;
pub mod export;
pub mod scorer;
pub mod session;
pub mod summary;
pub mod validator;

pub use scorer::{BatchScorer, Prediction};
pub use session::{ScoringSession, SessionEvent, SessionState};
pub use summary::BatchSummary;

use crate::error::{PipelineError, PipelineResult};
use crate::metrics::PipelineMetrics;
use crate::models::capability::ScoringModel;
use crate::reader::{self, RawBatch};
use crate::schema::FeatureSchema;
use crate::types::{Batch, ScoredBatch};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Scoring pipeline bound to one model capability and one schema.
pub struct ScoringPipeline<'m> {
    model: &'m dyn ScoringModel,
    schema: FeatureSchema,
    metrics: Arc<PipelineMetrics>,
}

impl<'m> ScoringPipeline<'m> {
    pub fn new(model: &'m dyn ScoringModel, schema: FeatureSchema, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            model,
            schema,
            metrics,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Decode an uploaded file.
    pub fn read<R: Read>(&self, input: R) -> PipelineResult<RawBatch> {
        self.observe("read", || {
            reader::read_batch(input, &self.schema).map_err(PipelineError::from)
        })
    }

    /// Check the column set and build typed records.
    pub fn validate(&self, raw: &RawBatch) -> PipelineResult<Batch> {
        let result = self.observe("validate", || validator::validate(raw, &self.schema));
        if let Err(PipelineError::Schema { missing }) = &result {
            warn!(
                missing = ?missing,
                rows = raw.len(),
                "Uploaded batch is missing required columns"
            );
        }
        result
    }

    /// Align, score and annotate a validated batch.
    pub fn classify(&self, batch: &Batch) -> PipelineResult<ScoredBatch> {
        self.metrics.record_run_started();

        let result = self.observe("classify", || {
            let aligned = self.timed("align", || aligner::align(batch));
            let predictions = self.timed("score", || BatchScorer::new(self.model).score(&aligned))?;
            let scored = annotator::annotate(batch, predictions)?;
            Ok(scored)
        });

        match &result {
            Ok(scored) => {
                if let Ok(summary) = summary::summarize(scored.transactions()) {
                    self.metrics.record_success(&summary, scored.transactions());
                    info!(
                        model = %self.model.name(),
                        total = summary.total(),
                        fraud_count = summary.fraud_count(),
                        fraud_percent = format!("{:.2}", summary.fraud_percent()),
                        "Batch classified"
                    );
                }
            }
            Err(e) => warn!(model = %self.model.name(), error = %e, "Classification failed"),
        }

        result
    }

    /// Summary of a scored batch, recomputed on every call.
    pub fn summarize(&self, scored: &ScoredBatch) -> PipelineResult<BatchSummary> {
        summary::summarize(scored.transactions())
    }

    /// Encode scored results for download.
    pub fn export(&self, scored: &ScoredBatch) -> PipelineResult<Vec<u8>> {
        self.observe("export", || export::encode(scored, &self.schema))
    }

    /// Run every stage on one uploaded file.
    pub fn run<R: Read>(&self, input: R) -> PipelineResult<RunOutcome> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, model = %self.model.name(), "Scoring run started");

        let raw = self.read(input)?;
        let batch = self.validate(&raw)?;
        let scored = self.classify(&batch)?;
        let summary = self.summarize(&scored)?;

        info!(run_id = %run_id, summary = %summary, "Scoring run complete");

        Ok(RunOutcome {
            run_id,
            scored_at: Utc::now(),
            scored,
            summary,
        })
    }

    fn observe<T>(&self, stage: &str, f: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
        let result = self.timed(stage, f);
        if let Err(e) = &result {
            self.metrics.record_failure(e.kind());
        }
        result
    }

    fn timed<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.metrics.record_stage_time(stage, start.elapsed());
        value
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub scored_at: DateTime<Utc>,
    pub scored: ScoredBatch,
    pub summary: BatchSummary,
}

impl RunOutcome {
    pub fn report(&self, model: &str, output_path: Option<String>) -> RunReport {
        RunReport {
            run_id: self.run_id,
            scored_at: self.scored_at,
            model: model.to_string(),
            total: self.summary.total(),
            fraud_count: self.summary.fraud_count(),
            fraud_percent: self.summary.fraud_percent(),
            output_path,
        }
    }
}

/// Machine-readable record of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub scored_at: DateTime<Utc>,
    pub model: String,
    pub total: usize,
    pub fraud_count: usize,
    pub fraud_percent: f64,
    pub output_path: Option<String>,
}
