//! Scoring model capability and its ONNX Runtime implementation

pub mod capability;
pub mod inference;
pub mod loader;
pub mod shared;

pub use capability::{ScoringModel, POSITIVE_CLASS};
pub use inference::OnnxModel;
pub use loader::ModelLoader;
