use ndarray::{Array1, ArrayView1};
use thiserror::Error;

use crate::Float;

/// Errors raised by a classifier when asked to score a row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The row does not have as many columns as the model was trained on
    #[error("expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// NaN or infinite value in the input row
    #[error("feature at index {index} is not finite")]
    NonFiniteFeature { index: usize },
    /// The model's parameters are internally inconsistent
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Errors raised by a fitted scaler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    #[error("scaler expects {expected} columns, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("column {column} is not a finite number")]
    NonFinite { column: String },
    #[error("invalid scaler: {0}")]
    InvalidScaler(String),
}

/// A classifier over two classes: 0 (retain) and 1 (churn).
pub trait BinaryClassifier<F: Float>: Send + Sync {
    /// Number of columns a row must have.
    fn n_features(&self) -> usize;

    /// Class distribution `[p_retain, p_churn]` for a single row.
    fn predict_proba(&self, features: ArrayView1<F>) -> Result<[F; 2], ModelError>;

    /// Hard class for a single row, `0` or `1`.
    fn predict(&self, features: ArrayView1<F>) -> Result<usize, ModelError>;

    /// Short human readable description, e.g. "Logistic regression (15 features)".
    fn name(&self) -> String;
}

/// A fitted column transform applied to a fixed, named subset of columns.
pub trait FeatureScaler<F: Float>: Send + Sync {
    /// Names of the columns this scaler was fitted on, in order.
    fn columns(&self) -> &[String];

    /// Transform one value per fitted column.
    fn transform(&self, values: ArrayView1<F>) -> Result<Array1<F>, ScalerError>;
}

/// Checks that `features` has `expected` entries, all finite.
pub fn check_dimension<F: Float>(features: ArrayView1<F>, expected: usize) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            found: features.len(),
        });
    }
    match features.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ModelError::NonFiniteFeature { index }),
        None => Ok(()),
    }
}
