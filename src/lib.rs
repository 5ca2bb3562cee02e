//! Customer churn prediction for a bank-churn tabular model.
//!
//! Form values go through [`features::assemble`], [`scaling::scale`] and
//! [`inference::predict`]; [`ChurnService`] runs the three steps behind a
//! single `submit` call.

pub mod artifacts;
pub mod config;
pub mod features;
pub mod inference;
pub mod insights;
pub mod scaling;
pub mod service;

#[cfg(test)]
mod testing;

pub use artifacts::{LoadError, LoadedArtifacts};
pub use churnguard_helpers::{
    ArtifactMeta, BinaryClassifier, FeatureScaler, Float, BOOLEAN_FEATURES, FEATURE_NAMES,
    N_FEATURES, N_NUMERIC, NUMERIC_FEATURES,
};
pub use config::{AppConfig, ConfigError};
pub use features::{assemble, AssembleError, FeatureVector, RawInputs, RawValue, ValidationError};
pub use inference::{predict, ChurnLabel, InferenceError, PredictionResult};
pub use insights::{ChartKind, InsightTable, InsightsError, InsightsWorkbook};
pub use scaling::{scale, ScaledFeatureVector, TransformError};
pub use service::{ChurnService, OneHotPolicy, SubmitError};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;
    use std::path::PathBuf;

    fn asset_config() -> AppConfig {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let mut config = AppConfig::default();
        config.artifacts.classifier = root.join("assets/model.json");
        config.artifacts.scaler = root.join("assets/scaler.json");
        config.insights.workbook = root.join("assets/insights/churn_insights.xlsx");
        config.insights.feature_importance = root.join("assets/insights/feature_importance.csv");
        config
    }

    #[test]
    fn test_sample_assets_predict() {
        let service = ChurnService::load(&asset_config()).unwrap();
        let result = service.submit(&RawInputs::defaults()).unwrap();
        assert_eq!(result.label, ChurnLabel::Retain);
        assert_abs_diff_eq!(
            result.probability_churn + result.probability_retain,
            1.0,
            epsilon = 1e-9
        );

        let risky = RawInputs::defaults()
            .with("Age", 70_i64)
            .with("Balance", 150000.0)
            .with("NumOfProducts", 1_i64)
            .with("IsActiveMember_0.0", true)
            .with("IsActiveMember_1.0", false)
            .with("Geography_France", false)
            .with("Geography_Germany", true)
            .with("Gender_Female", true)
            .with("Gender_Male", false);
        assert_eq!(service.submit(&risky).unwrap().label, ChurnLabel::Churned);
    }

    #[test]
    fn test_sample_forest_asset_loads() {
        let mut config = asset_config();
        config.artifacts.classifier = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/forest_model.json");
        let service = ChurnService::load(&config).unwrap();
        assert!(service.classifier_name().contains("boosted"));
        assert!(service.submit(&RawInputs::defaults()).is_ok());
    }

    #[test]
    fn test_sample_insights_open() {
        let config = asset_config();
        let workbook = InsightsWorkbook::open(&config.insights.workbook).unwrap();
        assert_eq!(workbook.sheets().len(), 5);
        let from_csv = InsightsWorkbook::open(config.insights.workbook.parent().unwrap()).unwrap();
        assert_eq!(from_csv, workbook);
        let importance = insights::read_feature_importance(&config.insights.feature_importance).unwrap();
        assert_eq!(importance.rows.len(), N_FEATURES);
    }

    #[test]
    fn test_random_forms_give_consistent_results() {
        let service = ChurnService::load(&asset_config()).unwrap();
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        for _ in 0..200 {
            let mut raw = RawInputs::defaults()
                .with("CreditScore", rng.random_range(350_i64..=850))
                .with("Age", rng.random_range(18_i64..=92))
                .with("Tenure", rng.random_range(0_i64..=10))
                .with("Balance", rng.random_range(0.0..250000.0))
                .with("NumOfProducts", rng.random_range(1_i64..=4))
                .with("EstimatedSalary", rng.random_range(0.0..200000.0));
            for group in churnguard_helpers::ONE_HOT_GROUPS.iter() {
                let mut columns = group.columns.to_vec();
                columns.shuffle(&mut rng);
                for (i, column) in columns.iter().enumerate() {
                    raw.insert(*column, i == 0);
                }
            }

            let result = service.submit(&raw).unwrap();
            assert!(result.is_reliable());
            assert_abs_diff_eq!(
                result.probability_churn + result.probability_retain,
                1.0,
                epsilon = 1e-6
            );
            let expected = if result.probability_churn > result.probability_retain {
                ChurnLabel::Churned
            } else {
                ChurnLabel::Retain
            };
            assert_eq!(result.label, expected);
            assert_eq!(service.submit(&raw).unwrap(), result);
        }
    }
}
