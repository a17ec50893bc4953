//! Fraud Scoring Pipeline Library
//!
//! Batch credit-card fraud scoring: an uploaded CSV is checked against the
//! reference schema, scored by a pre-trained classifier, annotated with
//! label and fraud probability, summarized and exported back as CSV.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod reference;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use error::{InferenceError, ParseError, PipelineError, PipelineResult};
pub use models::{ModelLoader, OnnxModel, ScoringModel};
pub use pipeline::{BatchSummary, ScoringPipeline, ScoringSession, SessionEvent, SessionState};
pub use reference::ReferenceDataset;
pub use schema::FeatureSchema;
pub use types::{Batch, FraudLabel, ScoredBatch, ScoredTransaction, TransactionRecord};
