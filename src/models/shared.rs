//! Process-wide capabilities: loaded once, reused for every run.
//!
//! There is no invalidation path; a new artifact needs a process restart.
//! A failed load is not cached, so the next caller retries it.

use crate::config::{DatasetConfig, ModelsConfig};
use crate::models::inference::OnnxModel;
use crate::models::loader::ModelLoader;
use crate::reference::ReferenceDataset;
use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing::info;

/// Lazily initialized, read-only capability.
pub struct SharedCapability<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> SharedCapability<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Return the capability, running `load` only if nothing is cached yet.
    ///
    /// Concurrent first callers block until one load finishes.
    pub fn get_or_load(&self, load: impl FnOnce() -> Result<T>) -> Result<&T> {
        self.cell.get_or_try_init(|| {
            info!(capability = self.name, "Initializing shared capability");
            load()
        })
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

static SCORING_MODEL: SharedCapability<OnnxModel> = SharedCapability::new("scoring_model");
static REFERENCE_DATASET: SharedCapability<ReferenceDataset> =
    SharedCapability::new("reference_dataset");

/// The process-wide scoring model.
pub fn scoring_model(config: &ModelsConfig) -> Result<&'static OnnxModel> {
    SCORING_MODEL.get_or_load(|| {
        ModelLoader::with_threads(config.onnx_threads).load_model(&config.model_path, &config.model_name)
    })
}

/// The process-wide reference dataset.
pub fn reference_dataset(config: &DatasetConfig) -> Result<&'static ReferenceDataset> {
    REFERENCE_DATASET.get_or_load(|| {
        ReferenceDataset::load(&config.reference_path, &config.label_column)
    })
}
