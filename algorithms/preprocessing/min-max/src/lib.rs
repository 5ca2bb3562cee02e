use churnguard_helpers::{FeatureScaler, Float, ScalerError};
use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A fitted min-max scaler.
///
/// Maps each column's training range `[data_min, data_max]` linearly onto
/// `feature_range` (by default `[0, 1]`). Values outside the training range are
/// extrapolated, not clipped. A column whose training range is empty is
/// treated as having range 1, so it is shifted but never divided by zero.
///
/// # Type Parameters
///
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct MinMaxScaler<F: Float> {
    #[cfg_attr(feature = "serde", serde(skip))]
    columns: Vec<String>,
    data_min: Vec<F>,
    data_max: Vec<F>,
    #[cfg_attr(feature = "serde", serde(default = "unit_range"))]
    feature_range: (F, F),
}

#[cfg(feature = "serde")]
fn unit_range<F: Float>() -> (F, F) {
    (F::zero(), F::one())
}

impl<F: Float> MinMaxScaler<F> {
    /// Creates a scaler from the per-column bounds observed at fit time.
    ///
    /// # Errors
    ///
    /// Returns `ScalerError::InvalidScaler` if the bound vectors do not have one
    /// entry per column, if a bound is not finite, if `data_min > data_max` for
    /// some column, or if the feature range is empty.
    pub fn from_bounds(
        columns: Vec<String>,
        data_min: Vec<F>,
        data_max: Vec<F>,
        feature_range: (F, F),
    ) -> Result<Self, ScalerError> {
        let scaler = Self {
            columns,
            data_min,
            data_max,
            feature_range,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Attaches column names to a scaler whose bounds were deserialized without them.
    pub fn with_columns(mut self, columns: Vec<String>) -> Result<Self, ScalerError> {
        self.columns = columns;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ScalerError> {
        let n = self.columns.len();
        if self.data_min.len() != n || self.data_max.len() != n {
            return Err(ScalerError::InvalidScaler(format!(
                "{} columns but {} minima and {} maxima",
                n,
                self.data_min.len(),
                self.data_max.len()
            )));
        }
        for (i, (lo, hi)) in self.data_min.iter().zip(&self.data_max).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(ScalerError::InvalidScaler(format!(
                    "non-finite bound for column {}",
                    self.columns[i]
                )));
            }
            if lo > hi {
                return Err(ScalerError::InvalidScaler(format!(
                    "data_min > data_max for column {}",
                    self.columns[i]
                )));
            }
        }
        let (lo, hi) = self.feature_range;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(ScalerError::InvalidScaler(format!(
                "feature range ({:?}, {:?}) is empty",
                lo, hi
            )));
        }
        Ok(())
    }

    /// Per-column multiplier applied by [`transform`](FeatureScaler::transform).
    pub fn scale(&self) -> Array1<F> {
        let (lo, hi) = self.feature_range;
        self.data_min
            .iter()
            .zip(&self.data_max)
            .map(|(&min, &max)| {
                let range = max - min;
                let range = if range == F::zero() { F::one() } else { range };
                (hi - lo) / range
            })
            .collect()
    }

    /// Per-column offset added after scaling.
    pub fn offset(&self) -> Array1<F> {
        let lo = self.feature_range.0;
        let scale = self.scale();
        self.data_min
            .iter()
            .zip(scale.iter())
            .map(|(&min, &s)| lo - min * s)
            .collect()
    }

    pub fn feature_range(&self) -> (F, F) {
        self.feature_range
    }
}

impl<F: Float> FeatureScaler<F> for MinMaxScaler<F> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Scales one value per fitted column: `x * scale + offset`.
    ///
    /// # Errors
    ///
    /// Returns `ScalerError::DimensionMismatch` if `values` does not have one
    /// entry per column and `ScalerError::NonFinite` if any value is NaN or infinite.
    fn transform(&self, values: ArrayView1<F>) -> Result<Array1<F>, ScalerError> {
        if values.len() != self.columns.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ScalerError::NonFinite {
                column: self.columns[i].clone(),
            });
        }
        Ok(&values * &self.scale() + &self.offset())
    }
}
