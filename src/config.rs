//! Optional TOML configuration.
//!
//! ```toml
//! [artifacts]
//! classifier = "assets/model.json"
//! scaler = "assets/scaler.json"
//!
//! [insights]
//! workbook = "assets/insights/churn_insights.xlsx"
//! feature_importance = "assets/insights/feature_importance.csv"
//!
//! [validation]
//! one_hot = "reject"   # or "flag"
//!
//! [ui]
//! sidebar_image = "assets/logo.png"
//! ```
//!
//! Every key is optional. Relative paths are taken relative to the working
//! directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::service::OneHotPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "churnguard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            classifier: PathBuf::from("assets/model.json"),
            scaler: PathBuf::from("assets/scaler.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPaths {
    /// Spreadsheet with the five insight sheets, or a directory with one CSV per sheet.
    pub workbook: PathBuf,
    pub feature_importance: PathBuf,
}

impl Default for InsightPaths {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("assets/insights/churn_insights.xlsx"),
            feature_importance: PathBuf::from("assets/insights/feature_importance.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub one_hot: OneHotPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Image shown at the top of the insights sidebar. None shows no image.
    pub sidebar_image: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub artifacts: ArtifactPaths,
    pub insights: InsightPaths,
    pub validation: ValidationConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!("No configuration at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }
}
