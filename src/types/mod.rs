//! Type definitions for the fraud scoring pipeline

pub mod scored;
pub mod transaction;

pub use scored::{FraudLabel, ScoredBatch, ScoredTransaction};
pub use transaction::{Batch, TransactionRecord};
