//! Calling the classifier on a scaled row and checking what it says.

use std::fmt::{Display, Formatter};

use churnguard_helpers::{BinaryClassifier, ModelError};
use thiserror::Error;

use crate::features::ValidationError;
use crate::scaling::ScaledFeatureVector;

/// Allowed deviation of `p_retain + p_churn` from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("classifier failed: {0}")]
    Model(#[from] ModelError),
    #[error("classifier returned invalid probabilities [{p_retain}, {p_churn}]")]
    InvalidProbabilities { p_retain: f64, p_churn: f64 },
    #[error("classifier returned unknown class {0}")]
    UnknownClass(usize),
    /// The hard label disagrees with the argmax of the probabilities
    #[error("classifier predicted class {class} but probabilities are [{p_retain}, {p_churn}]")]
    InconsistentOutputs {
        class: usize,
        p_retain: f64,
        p_churn: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChurnLabel {
    Retain,
    Churned,
}

impl ChurnLabel {
    /// Class 1 is churn, class 0 is retain.
    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(ChurnLabel::Retain),
            1 => Some(ChurnLabel::Churned),
            _ => None,
        }
    }

    pub fn class(self) -> usize {
        match self {
            ChurnLabel::Retain => 0,
            ChurnLabel::Churned => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChurnLabel::Retain => "Retain",
            ChurnLabel::Churned => "Churned",
        }
    }
}

impl Display for ChurnLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction. Created per submit and owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: ChurnLabel,
    pub probability_churn: f64,
    pub probability_retain: f64,
    /// One-hot violations that were let through; non-empty means the
    /// prediction is undefined and must be shown as such.
    pub warnings: Vec<ValidationError>,
}

impl PredictionResult {
    pub fn is_reliable(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs the classifier's probability and label functions on `vector`.
///
/// # Errors
///
/// Returns `InferenceError::Model` if the classifier rejects the row,
/// `InferenceError::InvalidProbabilities` if the distribution is not finite,
/// leaves `[0, 1]`, or does not sum to 1 within [`PROBABILITY_TOLERANCE`],
/// `InferenceError::UnknownClass` for a label other than 0 or 1, and
/// `InferenceError::InconsistentOutputs` when the label is not the argmax of
/// the probabilities (ties count as class 0).
pub fn predict(
    vector: &ScaledFeatureVector,
    classifier: &dyn BinaryClassifier<f64>,
) -> Result<PredictionResult, InferenceError> {
    let [p_retain, p_churn] = classifier.predict_proba(vector.values())?;
    let class = classifier.predict(vector.values())?;

    let in_unit = |p: f64| p.is_finite() && (-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(&p);
    if !in_unit(p_retain)
        || !in_unit(p_churn)
        || (p_retain + p_churn - 1.0).abs() > PROBABILITY_TOLERANCE
    {
        return Err(InferenceError::InvalidProbabilities { p_retain, p_churn });
    }

    let label = ChurnLabel::from_class(class).ok_or(InferenceError::UnknownClass(class))?;
    let argmax = usize::from(p_churn > p_retain);
    if class != argmax {
        return Err(InferenceError::InconsistentOutputs {
            class,
            p_retain,
            p_churn,
        });
    }

    Ok(PredictionResult {
        label,
        probability_churn: p_churn,
        probability_retain: p_retain,
        warnings: Vec::new(),
    })
}
