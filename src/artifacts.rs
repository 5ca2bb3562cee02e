//! Loading the fitted classifier and scaler from their JSON artifacts.
//!
//! Both artifacts carry an [`ArtifactMeta`] header. Loading fails unless the
//! classifier was fitted on the full 15-column schema, the scaler on the six
//! numeric columns, and both headers name the same schema tag and version.

use std::fs;
use std::path::{Path, PathBuf};

use churnguard_helpers::{ArtifactMeta, BinaryClassifier, FEATURE_NAMES, N_FEATURES, NUMERIC_FEATURES};
use forest::Forest;
use logistic::LogisticRegression;
use min_max::MinMaxScaler;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {} is incompatible: {reason}", .path.display())]
    Incompatible { path: PathBuf, reason: String },
    #[error("scaler schema {scaler} does not match classifier schema {classifier}")]
    SchemaMismatch { scaler: String, classifier: String },
}

/// The classifier families an artifact may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    Logistic(LogisticRegression<f64>),
    Forest(Forest<f64>),
}

impl ClassifierModel {
    fn validate(&self) -> Result<(), String> {
        let (result, n_features) = match self {
            ClassifierModel::Logistic(m) => (m.validate(), m.n_features()),
            ClassifierModel::Forest(m) => (m.validate(), m.n_features()),
        };
        result.map_err(|e| e.to_string())?;
        if n_features != N_FEATURES {
            return Err(format!(
                "model expects {} features, schema has {}",
                n_features, N_FEATURES
            ));
        }
        Ok(())
    }

    pub fn into_classifier(self) -> Box<dyn BinaryClassifier<f64>> {
        match self {
            ClassifierModel::Logistic(m) => Box::new(m),
            ClassifierModel::Forest(m) => Box::new(m),
        }
    }
}

/// On-disk layout of the classifier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub meta: ArtifactMeta,
    pub model: ClassifierModel,
}

/// On-disk layout of the scaler artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub meta: ArtifactMeta,
    #[serde(flatten)]
    pub scaler: MinMaxScaler<f64>,
}

/// Everything the form needs from disk, loaded once at startup.
pub struct LoadedArtifacts {
    pub classifier: Box<dyn BinaryClassifier<f64>>,
    pub scaler: MinMaxScaler<f64>,
    pub meta: ArtifactMeta,
}

impl std::fmt::Debug for LoadedArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifacts")
            .field("classifier", &self.classifier.name())
            .field("scaler", &self.scaler)
            .field("meta", &self.meta)
            .finish()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn incompatible(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Incompatible {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Reads and checks a classifier artifact.
pub fn load_classifier(path: &Path) -> Result<(ArtifactMeta, Box<dyn BinaryClassifier<f64>>), LoadError> {
    debug!("Loading classifier from {:?}", path);
    let artifact: ClassifierArtifact = read_json(path)?;
    if !artifact.meta.matches_columns(&FEATURE_NAMES) {
        return Err(incompatible(
            path,
            format!("columns {:?} do not match the feature schema", artifact.meta.columns),
        ));
    }
    artifact.model.validate().map_err(|reason| incompatible(path, reason))?;
    let classifier = artifact.model.into_classifier();
    info!("Loaded classifier: {}", classifier.name());
    Ok((artifact.meta, classifier))
}

/// Reads and checks a scaler artifact.
pub fn load_scaler(path: &Path) -> Result<(ArtifactMeta, MinMaxScaler<f64>), LoadError> {
    debug!("Loading scaler from {:?}", path);
    let artifact: ScalerArtifact = read_json(path)?;
    if !artifact.meta.matches_columns(&NUMERIC_FEATURES) {
        return Err(incompatible(
            path,
            format!("columns {:?} are not the numeric columns", artifact.meta.columns),
        ));
    }
    let scaler = artifact
        .scaler
        .with_columns(artifact.meta.columns.clone())
        .map_err(|e| incompatible(path, e.to_string()))?;
    info!("Loaded min-max scaler over {} columns", NUMERIC_FEATURES.len());
    Ok((artifact.meta, scaler))
}

/// Loads both artifacts and checks that they belong together.
///
/// # Errors
///
/// Any `LoadError`; there is no retry, and callers are expected to stop.
pub fn load(classifier_path: &Path, scaler_path: &Path) -> Result<LoadedArtifacts, LoadError> {
    let (model_meta, classifier) = load_classifier(classifier_path)?;
    let (scaler_meta, scaler) = load_scaler(scaler_path)?;
    if !scaler_meta.is_compatible_with(&model_meta) {
        return Err(LoadError::SchemaMismatch {
            scaler: format!("{} v{}", scaler_meta.schema, scaler_meta.version),
            classifier: format!("{} v{}", model_meta.schema, model_meta.version),
        });
    }
    Ok(LoadedArtifacts {
        classifier,
        scaler,
        meta: model_meta,
    })
}
