use ndarray::{NdFloat, ScalarOperand};
use num_traits::{FromPrimitive, NumCast};

use std::iter::Sum;

// Include submodules
mod model;
mod schema;

// Re-export types from submodules
pub use model::{check_dimension, BinaryClassifier, FeatureScaler, ModelError, ScalerError};
pub use schema::{
    column_index, is_numeric, ArtifactMeta, OneHotGroup, BOOLEAN_FEATURES, FEATURE_NAMES,
    N_FEATURES, N_NUMERIC, NUMERIC_FEATURES, ONE_HOT_GROUPS, SCHEMA_TAG, SCHEMA_VERSION,
};

pub trait Float:
    NdFloat + FromPrimitive + Default + Sum + ScalarOperand + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Logistic function, split on the sign of `self` so neither branch overflows.
    fn sigmoid(self) -> Self {
        if self >= Self::zero() {
            Self::one() / (Self::one() + (-self).exp())
        } else {
            let e = self.exp();
            e / (Self::one() + e)
        }
    }
}

impl Float for f32 {}

impl Float for f64 {}
