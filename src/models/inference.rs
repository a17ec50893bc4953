//! ONNX Runtime implementation of the scoring model capability

use crate::models::capability::ScoringModel;
use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView2};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::sync::Mutex;
use tracing::debug;

/// Binary classifier exported to ONNX (XGBoost, LightGBM, CatBoost, ...).
///
/// Running a session needs exclusive access, so calls are serialized
/// through a mutex. Each `predict`/`predict_proba` is one batched run.
#[derive(Debug)]
pub struct OnnxModel {
    /// Model name
    name: String,
    /// ONNX Runtime session
    session: Mutex<Session>,
    /// Input name for the feature matrix
    input_name: String,
    /// Output name for predicted labels
    label_output: String,
    /// Output name for class probabilities
    probability_output: String,
}

impl OnnxModel {
    pub(crate) fn new(
        name: &str,
        session: Session,
        input_name: String,
        label_output: String,
        probability_output: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        }
    }

    /// Run the session once and hand its outputs to `extract`.
    fn run<T>(
        &self,
        rows: ArrayView2<'_, f64>,
        extract: impl FnOnce(&SessionOutputs) -> Result<T>,
    ) -> Result<T> {
        // Prepare input tensor - shape [rows, features]
        let shape = vec![rows.nrows() as i64, rows.ncols() as i64];
        let data: Vec<f32> = rows.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;
        extract(&outputs)
    }

    fn output<'a>(&self, outputs: &'a SessionOutputs, name: &str) -> Result<&'a DynValue> {
        outputs
            .get(name)
            .with_context(|| format!("Model `{}` has no output named `{}`", self.name, name))
    }

    fn extract_labels(&self, outputs: &SessionOutputs) -> Result<Vec<i64>> {
        let output = self.output(outputs, &self.label_output)?;
        let (_, data) = output
            .try_extract_tensor::<i64>()
            .context("Label output is not an int64 tensor")?;
        Ok(data.to_vec())
    }

    /// Extract the probability matrix.
    /// Handles both tensor outputs (XGBoost, Random Forest) and seq(map)
    /// outputs (CatBoost, LightGBM).
    fn extract_probabilities(&self, outputs: &SessionOutputs, rows: usize) -> Result<Array2<f64>> {
        let output = self.output(outputs, &self.probability_output)?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let classes = match dims.as_slice() {
                [_, classes] => *classes as usize,
                [_] => 1,
                _ => anyhow::bail!("Unexpected probability tensor shape {:?}", dims),
            };
            debug!(model = %self.name, shape = ?dims, "Extracted probabilities from tensor");
            return Array2::from_shape_vec(
                (rows, classes),
                data.iter().map(|&p| p as f64).collect(),
            )
            .context("Probability tensor does not match the batch size");
        }

        self.extract_from_sequence_map(output, rows)
    }

    /// Extract probabilities from seq(map(int64, float)), one map per row
    fn extract_from_sequence_map(&self, output: &DynValue, rows: usize) -> Result<Array2<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        if maps.len() != rows {
            anyhow::bail!("Probability sequence has {} maps for {} rows", maps.len(), rows);
        }

        let mut per_row = Vec::with_capacity(maps.len());
        let mut classes = 0;
        for map_value in &maps {
            let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
            for (class_id, _) in &kv_pairs {
                if *class_id < 0 {
                    anyhow::bail!("Negative class id {} in probability map", class_id);
                }
                classes = classes.max(*class_id as usize + 1);
            }
            per_row.push(kv_pairs);
        }

        let mut probabilities = Array2::<f64>::zeros((rows, classes));
        for (i, kv_pairs) in per_row.iter().enumerate() {
            for (class_id, prob) in kv_pairs {
                probabilities[[i, *class_id as usize]] = *prob as f64;
            }
        }

        debug!(model = %self.name, rows = rows, classes = classes, "Extracted probabilities from seq(map)");
        Ok(probabilities)
    }
}

impl ScoringModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, rows: ArrayView2<'_, f64>) -> Result<Vec<i64>> {
        self.run(rows, |outputs| self.extract_labels(outputs))
    }

    fn predict_proba(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n = rows.nrows();
        self.run(rows, |outputs| self.extract_probabilities(outputs, n))
    }
}
