//! Shared fixtures for unit tests.

use churnguard_helpers::{BinaryClassifier, ModelError, FEATURE_NAMES, N_FEATURES, NUMERIC_FEATURES};
use logistic::LogisticRegression;
use min_max::MinMaxScaler;
use ndarray::ArrayView1;

/// A scaler over the usual bank-churn ranges.
pub(crate) fn bank_scaler() -> MinMaxScaler<f64> {
    MinMaxScaler::from_bounds(
        NUMERIC_FEATURES.iter().map(|c| c.to_string()).collect(),
        vec![350.0, 18.0, 0.0, 0.0, 1.0, 0.0],
        vec![850.0, 92.0, 10.0, 250000.0, 4.0, 200000.0],
        (0.0, 1.0),
    )
    .unwrap()
}

/// Same coefficients as `assets/model.json`.
pub(crate) fn sample_logistic() -> LogisticRegression<f64> {
    LogisticRegression::new(
        vec![
            -0.45, 5.2, -0.15, 0.65, -0.35, 0.08, // numeric
            0.03, -0.03, 0.52, -0.52, -0.28, 0.52, -0.24, 0.27, -0.27,
        ],
        -2.55,
    )
    .unwrap()
}

/// A classifier double returning canned outputs.
pub(crate) struct FixedClassifier {
    proba: [f64; 2],
    class: usize,
}

impl FixedClassifier {
    pub(crate) fn new(proba: [f64; 2], class: usize) -> Self {
        Self { proba, class }
    }
}

impl BinaryClassifier<f64> for FixedClassifier {
    fn n_features(&self) -> usize {
        N_FEATURES
    }

    fn predict_proba(&self, _features: ArrayView1<f64>) -> Result<[f64; 2], ModelError> {
        Ok(self.proba)
    }

    fn predict(&self, _features: ArrayView1<f64>) -> Result<usize, ModelError> {
        Ok(self.class)
    }

    fn name(&self) -> String {
        format!("fixed ({} columns)", FEATURE_NAMES.len())
    }
}
