use churnguard_helpers::{check_dimension, BinaryClassifier, Float, ModelError};
use ndarray::{ArrayView1, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A binary logistic-regression classifier.
///
/// Scores a row as `w·x + b` and maps the score through the logistic function
/// to obtain the probability of class 1. The hard label is 1 exactly when the
/// score is positive, i.e. when the class-1 probability exceeds one half.
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
pub struct LogisticRegression<F: Float> {
    coefficients: Vec<F>,
    intercept: F,
}

impl<F: Float> LogisticRegression<F> {
    /// Creates a classifier from fitted coefficients and intercept.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidModel` if there are no coefficients or if any
    /// parameter is not finite.
    pub fn new(coefficients: Vec<F>, intercept: F) -> Result<Self, ModelError> {
        let model = Self {
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Checks the parameters of a deserialized model.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::InvalidModel("no coefficients".into()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidModel("non-finite parameter".into()));
        }
        Ok(())
    }

    /// The raw score `w·x + b` for a row.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DimensionMismatch` if the row has the wrong width and
    /// `ModelError::NonFiniteFeature` if it contains NaN or infinite values.
    pub fn decision_function(&self, features: ArrayView1<F>) -> Result<F, ModelError> {
        check_dimension(features, self.coefficients.len())?;
        let weights = ArrayView1::from(self.coefficients.as_slice());
        let mut score = self.intercept;
        Zip::from(&weights)
            .and(&features)
            .for_each(|&w, &x| score += w * x);
        Ok(score)
    }

    pub fn coefficients(&self) -> &[F] {
        &self.coefficients
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }
}

impl<F: Float> BinaryClassifier<F> for LogisticRegression<F> {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: ArrayView1<F>) -> Result<[F; 2], ModelError> {
        let p_churn = self.decision_function(features)?.sigmoid();
        Ok([F::one() - p_churn, p_churn])
    }

    /// Argmax over [`predict_proba`](BinaryClassifier::predict_proba); a tie goes to class 0.
    fn predict(&self, features: ArrayView1<F>) -> Result<usize, ModelError> {
        let [p_retain, p_churn] = self.predict_proba(features)?;
        Ok(usize::from(p_churn > p_retain))
    }

    fn name(&self) -> String {
        format!("Logistic regression ({} features)", self.coefficients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn simple_model() -> LogisticRegression<f64> {
        LogisticRegression::new(vec![2.0, -1.0, 0.5], -0.25).unwrap()
    }

    #[test]
    fn test_decision_function() {
        let model = simple_model();
        let score = model.decision_function(array![1.0, 1.0, 1.0].view()).unwrap();
        assert_abs_diff_eq!(score, 1.25);
    }

    #[test]
    fn test_probabilities_sum_to_one_and_match_label() {
        let model = simple_model();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        for _ in 0..1000 {
            let row: Array1<f64> = (0..3).map(|_| rng.random_range(-5.0..5.0)).collect();
            let [p_retain, p_churn] = model.predict_proba(row.view()).unwrap();
            assert_abs_diff_eq!(p_retain + p_churn, 1.0, epsilon = 1e-12);
            let label = model.predict(row.view()).unwrap();
            assert_eq!(label == 1, p_churn > p_retain);
        }
    }

    #[test]
    fn test_zero_score_is_retain() {
        let model = LogisticRegression::new(vec![1.0], 0.0).unwrap();
        let [p_retain, p_churn] = model.predict_proba(array![0.0].view()).unwrap();
        assert_abs_diff_eq!(p_retain, 0.5);
        assert_abs_diff_eq!(p_churn, 0.5);
        assert_eq!(model.predict(array![0.0].view()).unwrap(), 0);
    }

    #[test]
    fn test_tiny_positive_score_agrees_with_probabilities() {
        let mut coefficients = vec![0.0; 15];
        coefficients[0] = 1.0;
        let model = LogisticRegression::new(coefficients, 0.0).unwrap();
        let mut row = Array1::zeros(15);
        row[0] = 1e-17;
        assert!(model.decision_function(row.view()).unwrap() > 0.0);
        let [p_retain, p_churn] = model.predict_proba(row.view()).unwrap();
        let label = model.predict(row.view()).unwrap();
        assert_eq!(label == 1, p_churn > p_retain);
    }

    #[test]
    fn test_error_on_wrong_width() {
        let model = simple_model();
        let result = model.predict(array![1.0, 2.0].view());
        assert!(matches!(
            result,
            Err(ModelError::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_error_on_invalid_parameters() {
        assert!(LogisticRegression::<f64>::new(vec![], 0.0).is_err());
        assert!(LogisticRegression::new(vec![1.0, f64::INFINITY], 0.0).is_err());
        assert!(LogisticRegression::new(vec![1.0], f64::NAN).is_err());
    }
}
