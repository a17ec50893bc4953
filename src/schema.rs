//! Feature schema expected by the scoring model.
//!
//! The model was trained on the public credit-card fraud dataset: one time
//! field, 28 anonymized principal components and the transaction amount, in
//! that order. Column order is significant and must never be changed.

/// Name of the time column (seconds since the first transaction).
pub const TIME_COLUMN: &str = "Time";

/// Name of the amount column.
pub const AMOUNT_COLUMN: &str = "Amount";

/// Default name of the ground-truth label column.
pub const DEFAULT_LABEL_COLUMN: &str = "Class";

/// Number of anonymized principal-component features (`V1`..`V28`).
pub const PCA_COMPONENTS: usize = 28;

/// Total number of model input features.
pub const FEATURE_COUNT: usize = PCA_COMPONENTS + 2;

/// Ordered set of feature columns plus the optional ground-truth column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    label_column: String,
}

impl FeatureSchema {
    /// Standard credit-card schema with a custom label column name.
    pub fn new(label_column: impl Into<String>) -> Self {
        let mut columns = Vec::with_capacity(FEATURE_COUNT);
        columns.push(TIME_COLUMN.to_string());
        columns.extend((1..=PCA_COMPONENTS).map(component_name));
        columns.push(AMOUNT_COLUMN.to_string());

        Self {
            columns,
            label_column: label_column.into(),
        }
    }

    /// Required feature columns, in model order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Ground-truth label column name.
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a feature column in model order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_feature(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_label(&self, name: &str) -> bool {
        self.label_column == name
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_COLUMN)
    }
}

/// Column name of the `n`-th principal component (1-based).
pub fn component_name(n: usize) -> String {
    format!("V{}", n)
}
