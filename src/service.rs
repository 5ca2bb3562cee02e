use std::fmt::{Debug, Formatter};

use churnguard_helpers::{BinaryClassifier, FeatureScaler};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifacts::{self, LoadError, LoadedArtifacts};
use crate::config::AppConfig;
use crate::features::{assemble, AssembleError, RawInputs, ValidationError};
use crate::inference::{predict, InferenceError, PredictionResult};
use crate::scaling::{scale, TransformError};

/// What to do when a one-hot group does not have exactly one active flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneHotPolicy {
    /// Refuse to predict.
    #[default]
    Reject,
    /// Predict, but attach the violations to the result.
    Flag,
}

/// Errors of a single submit. None of these invalidate the service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("invalid input: {}", describe(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

fn describe(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The loaded classifier and scaler, ready to answer submits.
///
/// Built once and never mutated afterwards; every submit gets its own
/// [`PredictionResult`].
pub struct ChurnService {
    classifier: Box<dyn BinaryClassifier<f64>>,
    scaler: Box<dyn FeatureScaler<f64>>,
    one_hot: OneHotPolicy,
}

impl Debug for ChurnService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnService")
            .field("classifier", &self.classifier.name())
            .field("scaler_columns", &self.scaler.columns())
            .field("one_hot", &self.one_hot)
            .finish()
    }
}

impl ChurnService {
    pub fn new(classifier: Box<dyn BinaryClassifier<f64>>, scaler: Box<dyn FeatureScaler<f64>>) -> Self {
        Self {
            classifier,
            scaler,
            one_hot: OneHotPolicy::default(),
        }
    }

    pub fn with_one_hot_policy(mut self, policy: OneHotPolicy) -> Self {
        self.one_hot = policy;
        self
    }

    pub fn from_artifacts(artifacts: LoadedArtifacts) -> Self {
        Self::new(artifacts.classifier, Box::new(artifacts.scaler))
    }

    /// Loads the artifacts named in `config`.
    pub fn load(config: &AppConfig) -> Result<Self, LoadError> {
        let loaded = artifacts::load(&config.artifacts.classifier, &config.artifacts.scaler)?;
        info!(
            "Churn service ready: {} on schema {} v{}",
            loaded.classifier.name(),
            loaded.meta.schema,
            loaded.meta.version
        );
        Ok(Self::from_artifacts(loaded).with_one_hot_policy(config.validation.one_hot))
    }

    pub fn classifier_name(&self) -> String {
        self.classifier.name()
    }

    pub fn one_hot_policy(&self) -> OneHotPolicy {
        self.one_hot
    }

    /// Assembles, checks, scales and classifies one set of form values.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Validation` when a one-hot group is violated under
    /// [`OneHotPolicy::Reject`]; otherwise whatever the assemble, scale or
    /// predict step reports.
    pub fn submit(&self, raw: &RawInputs) -> Result<PredictionResult, SubmitError> {
        let vector = assemble(raw)?;

        let violations = vector.one_hot_violations();
        if !violations.is_empty() {
            match self.one_hot {
                OneHotPolicy::Reject => {
                    warn!("Rejected submit: {}", describe(&violations));
                    return Err(SubmitError::Validation(violations));
                }
                OneHotPolicy::Flag => warn!("Prediction undefined: {}", describe(&violations)),
            }
        }

        let scaled = scale(&vector, self.scaler.as_ref())?;
        let mut result = predict(&scaled, self.classifier.as_ref())?;
        result.warnings = violations;
        debug!(
            "Prediction {} (churn {:.4}, retain {:.4})",
            result.label, result.probability_churn, result.probability_retain
        );
        Ok(result)
    }
}
