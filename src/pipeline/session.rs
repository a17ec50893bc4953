//! Interactive scoring session.
//!
//! Models the analyst's flow as explicit states:
//! `Idle → Uploaded → Validated → Scored → Exported`.
//! Each external trigger is a [`SessionEvent`]. A failed stage leaves the
//! session in the state it was in before that stage ran.

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::summary::BatchSummary;
use crate::pipeline::ScoringPipeline;
use crate::reader::RawBatch;
use crate::types::{Batch, ScoredBatch};
use std::mem;
use tracing::debug;

/// External triggers consumed by the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A file was uploaded
    FileReceived(Vec<u8>),
    /// The analyst asked for classification
    ClassifyRequested,
    /// The analyst asked to download results
    DownloadRequested,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::FileReceived(_) => "file_received",
            SessionEvent::ClassifyRequested => "classify_requested",
            SessionEvent::DownloadRequested => "download_requested",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Waiting for an upload
    #[default]
    Idle,
    /// Decoded but rejected by the schema validator
    Uploaded(RawBatch),
    /// Ready to classify
    Validated(Batch),
    /// Classified; the validated batch is kept so it can be re-scored
    Scored { batch: Batch, scored: ScoredBatch },
    /// Results encoded for download
    Exported {
        batch: Batch,
        scored: ScoredBatch,
        file: Vec<u8>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploaded(_) => "uploaded",
            SessionState::Validated(_) => "validated",
            SessionState::Scored { .. } => "scored",
            SessionState::Exported { .. } => "exported",
        }
    }

    /// Scored results, once classification has succeeded.
    pub fn scored(&self) -> Option<&ScoredBatch> {
        match self {
            SessionState::Scored { scored, .. } | SessionState::Exported { scored, .. } => {
                Some(scored)
            }
            _ => None,
        }
    }

    /// Encoded results, once a download has been prepared.
    pub fn exported_file(&self) -> Option<&[u8]> {
        match self {
            SessionState::Exported { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// One analyst's session over a shared pipeline.
pub struct ScoringSession<'p, 'm> {
    pipeline: &'p ScoringPipeline<'m>,
    state: SessionState,
}

impl<'p, 'm> ScoringSession<'p, 'm> {
    pub fn new(pipeline: &'p ScoringPipeline<'m>) -> Self {
        Self {
            pipeline,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Summary of the current results, recomputed on every call.
    pub fn summary(&self) -> Option<PipelineResult<BatchSummary>> {
        self.state.scored().map(|s| self.pipeline.summarize(s))
    }

    /// Apply one event. On error the state is the one before the failed stage.
    pub fn handle(&mut self, event: SessionEvent) -> PipelineResult<&SessionState> {
        let event_name = event.name();
        let previous = mem::take(&mut self.state);
        let from = previous.name();

        let (next, result) = self.transition(previous, event);
        debug!(
            event = event_name,
            from = from,
            to = next.name(),
            ok = result.is_ok(),
            "Session transition"
        );
        self.state = next;

        result.map(|()| &self.state)
    }

    fn transition(
        &self,
        state: SessionState,
        event: SessionEvent,
    ) -> (SessionState, PipelineResult<()>) {
        match (state, event) {
            (_, SessionEvent::FileReceived(bytes)) => {
                let raw = match self.pipeline.read(bytes.as_slice()) {
                    Ok(raw) => raw,
                    Err(e) => return (SessionState::Idle, Err(e)),
                };
                match self.pipeline.validate(&raw) {
                    Ok(batch) => (SessionState::Validated(batch), Ok(())),
                    Err(e) => (SessionState::Uploaded(raw), Err(e)),
                }
            }

            (
                SessionState::Validated(batch)
                | SessionState::Scored { batch, .. }
                | SessionState::Exported { batch, .. },
                SessionEvent::ClassifyRequested,
            ) => match self.pipeline.classify(&batch) {
                Ok(scored) => (SessionState::Scored { batch, scored }, Ok(())),
                Err(e) => (SessionState::Validated(batch), Err(e)),
            },

            (
                SessionState::Scored { batch, scored }
                | SessionState::Exported { batch, scored, .. },
                SessionEvent::DownloadRequested,
            ) => match self.pipeline.export(&scored) {
                Ok(file) => (
                    SessionState::Exported {
                        batch,
                        scored,
                        file,
                    },
                    Ok(()),
                ),
                Err(e) => (SessionState::Scored { batch, scored }, Err(e)),
            },

            (state, event) => {
                let err = PipelineError::InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                };
                (state, Err(err))
            }
        }
    }
}
