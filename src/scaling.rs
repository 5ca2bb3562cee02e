//! Applying the fitted scaler to the continuous columns of a feature vector.

use churnguard_helpers::{column_index, FeatureScaler, ScalerError, N_NUMERIC, NUMERIC_FEATURES};
use ndarray::{s, Array1, ArrayView1};
use thiserror::Error;

use crate::features::FeatureVector;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The scaler was not fitted on exactly the numeric columns of the schema
    #[error("scaler columns {found:?} do not match the numeric columns {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("column {column} is not a finite number")]
    NonNumeric { column: String },
    #[error(transparent)]
    Scaler(#[from] ScalerError),
}

/// A feature vector whose continuous columns have been scaled; the boolean
/// columns are copied unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatureVector {
    values: Array1<f64>,
}

impl ScaledFeatureVector {
    /// Wraps a row that is already scaled, for callers holding their own transform.
    pub fn from_array(values: Array1<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn numeric(&self) -> ArrayView1<'_, f64> {
        self.values.slice(s![..N_NUMERIC])
    }

    pub fn flags(&self) -> ArrayView1<'_, f64> {
        self.values.slice(s![N_NUMERIC..])
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        column_index(column).and_then(|i| self.values.get(i).copied())
    }
}

/// Scales the six continuous columns of `vector` with `scaler`.
///
/// # Errors
///
/// Returns `TransformError::ColumnMismatch` if the scaler was fitted on any
/// column set other than the numeric columns in schema order,
/// `TransformError::NonNumeric` if one of those columns holds NaN or an
/// infinity, and `TransformError::Scaler` if the scaler itself rejects the row.
pub fn scale(
    vector: &FeatureVector,
    scaler: &dyn FeatureScaler<f64>,
) -> Result<ScaledFeatureVector, TransformError> {
    let columns = scaler.columns();
    let matches = columns.len() == N_NUMERIC
        && columns.iter().zip(NUMERIC_FEATURES).all(|(a, b)| a == b);
    if !matches {
        return Err(TransformError::ColumnMismatch {
            expected: NUMERIC_FEATURES.iter().map(|c| c.to_string()).collect(),
            found: columns.to_vec(),
        });
    }

    let numeric = vector.numeric();
    if let Some(i) = numeric.iter().position(|v| !v.is_finite()) {
        return Err(TransformError::NonNumeric {
            column: NUMERIC_FEATURES[i].to_string(),
        });
    }

    let scaled = scaler.transform(numeric)?;
    if scaled.len() != N_NUMERIC {
        return Err(ScalerError::DimensionMismatch {
            expected: N_NUMERIC,
            found: scaled.len(),
        }
        .into());
    }

    let mut values = vector.clone().into_array();
    values.slice_mut(s![..N_NUMERIC]).assign(&scaled);
    Ok(ScaledFeatureVector { values })
}
