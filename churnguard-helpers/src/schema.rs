//! The fixed column schema shared by the scaler, the classifier and the form.
//!
//! Column order is the order the classifier was trained on. Every vector that
//! reaches a model is laid out exactly as [`FEATURE_NAMES`].

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

pub const N_FEATURES: usize = 15;
pub const N_NUMERIC: usize = 6;

/// Tag written into both artifacts' headers.
pub const SCHEMA_TAG: &str = "bank-churn";
pub const SCHEMA_VERSION: u32 = 1;

pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "CreditScore",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "EstimatedSalary",
    "HasCrCard_0.0",
    "HasCrCard_1.0",
    "IsActiveMember_0.0",
    "IsActiveMember_1.0",
    "Geography_France",
    "Geography_Germany",
    "Geography_Spain",
    "Gender_Female",
    "Gender_Male",
];

/// The continuous columns, which are also the first `N_NUMERIC` entries of [`FEATURE_NAMES`].
pub const NUMERIC_FEATURES: [&str; N_NUMERIC] = [
    "CreditScore",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "EstimatedSalary",
];

pub const BOOLEAN_FEATURES: [&str; N_FEATURES - N_NUMERIC] = [
    "HasCrCard_0.0",
    "HasCrCard_1.0",
    "IsActiveMember_0.0",
    "IsActiveMember_1.0",
    "Geography_France",
    "Geography_Germany",
    "Geography_Spain",
    "Gender_Female",
    "Gender_Male",
];

/// A set of mutually exclusive boolean columns; exactly one should be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHotGroup {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const ONE_HOT_GROUPS: [OneHotGroup; 4] = [
    OneHotGroup {
        name: "HasCrCard",
        columns: &["HasCrCard_0.0", "HasCrCard_1.0"],
    },
    OneHotGroup {
        name: "IsActiveMember",
        columns: &["IsActiveMember_0.0", "IsActiveMember_1.0"],
    },
    OneHotGroup {
        name: "Geography",
        columns: &["Geography_France", "Geography_Germany", "Geography_Spain"],
    },
    OneHotGroup {
        name: "Gender",
        columns: &["Gender_Female", "Gender_Male"],
    },
];

/// Position of `name` in [`FEATURE_NAMES`].
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|c| *c == name)
}

pub fn is_numeric(name: &str) -> bool {
    NUMERIC_FEATURES.contains(&name)
}

/// Header carried by every serialized artifact so that a scaler and a
/// classifier fitted on different schemas are never paired.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ArtifactMeta {
    pub schema: String,
    pub version: u32,
    pub columns: Vec<String>,
}

impl ArtifactMeta {
    /// Header for the current schema tag and version over `columns`.
    pub fn for_columns(columns: &[&str]) -> Self {
        Self {
            schema: SCHEMA_TAG.to_string(),
            version: SCHEMA_VERSION,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn matches_columns(&self, expected: &[&str]) -> bool {
        self.columns.len() == expected.len()
            && self.columns.iter().zip(expected).all(|(a, b)| a == b)
    }

    /// Two artifacts are compatible when they carry the same schema tag and version.
    pub fn is_compatible_with(&self, other: &ArtifactMeta) -> bool {
        self.schema == other.schema && self.version == other.version
    }
}
