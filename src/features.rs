//! Turning raw form values into the fixed 15-column feature vector.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use churnguard_helpers::{column_index, is_numeric, FEATURE_NAMES, N_FEATURES, N_NUMERIC, ONE_HOT_GROUPS};
use ndarray::{s, Array1, ArrayView1};
use thiserror::Error;

/// Form defaults for the six numeric columns, in schema order.
pub const DEFAULT_NUMERIC: [f64; N_NUMERIC] = [600.0, 30.0, 2.0, 8000.0, 2.0, 60000.0];

/// Form defaults for the nine boolean columns, in schema order: a card holder,
/// an active member, in France, male.
pub const DEFAULT_FLAGS: [bool; N_FEATURES - N_NUMERIC] =
    [false, true, false, true, true, false, false, false, true];

/// Errors raised while mapping raw form values onto the schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssembleError {
    #[error("missing input field {0}")]
    MissingField(String),
    #[error("unknown input field {0}")]
    UnknownField(String),
    #[error("field {field} expects a number, got {value}")]
    NotNumeric { field: String, value: String },
    #[error("field {field} expects true or false, got {value}")]
    NotBoolean { field: String, value: String },
}

/// A one-hot group whose number of active flags is not exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{group}: {active} of {size} flags set, expected exactly 1")]
pub struct ValidationError {
    pub group: &'static str,
    pub active: usize,
    pub size: usize,
}

/// A single value as entered in the form.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Integer(i64),
    Real(f64),
    Flag(bool),
    Text(String),
}

impl Display for RawValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Integer(v) => write!(f, "{}", v),
            RawValue::Real(v) => write!(f, "{}", v),
            RawValue::Flag(v) => write!(f, "{}", v),
            RawValue::Text(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Integer(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Real(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Flag(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl RawValue {
    fn as_number(&self, field: &str) -> Result<f64, AssembleError> {
        let not_numeric = || AssembleError::NotNumeric {
            field: field.to_string(),
            value: self.to_string(),
        };
        match self {
            RawValue::Integer(v) => Ok(*v as f64),
            RawValue::Real(v) => Ok(*v),
            RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
            RawValue::Flag(_) => Err(not_numeric()),
        }
    }

    fn as_flag(&self, field: &str) -> Result<bool, AssembleError> {
        let not_boolean = || AssembleError::NotBoolean {
            field: field.to_string(),
            value: self.to_string(),
        };
        match self {
            RawValue::Flag(b) => Ok(*b),
            RawValue::Integer(0) => Ok(false),
            RawValue::Integer(1) => Ok(true),
            RawValue::Real(v) if *v == 0.0 => Ok(false),
            RawValue::Real(v) if *v == 1.0 => Ok(true),
            RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(not_boolean()),
            },
            _ => Err(not_boolean()),
        }
    }
}

/// Field name to raw value, in whatever order the form produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInputs {
    values: BTreeMap<String, RawValue>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// The form's initial state.
    pub fn defaults() -> Self {
        let numeric = DEFAULT_NUMERIC.iter().map(|&v| RawValue::Real(v));
        let flags = DEFAULT_FLAGS.iter().map(|&v| RawValue::Flag(v));
        FEATURE_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(numeric.chain(flags))
            .collect()
    }

    /// Sets `field`, returning the value it replaced.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Option<RawValue> {
        self.values.insert(field.into(), value.into())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<RawValue> {
        self.values.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RawValue)> for RawInputs {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// One row laid out exactly as [`FEATURE_NAMES`]; booleans are `0.0` / `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f64>,
}

impl FeatureVector {
    /// Wraps an already ordered row. Returns `None` unless it has exactly 15 entries.
    pub fn from_array(values: Array1<f64>) -> Option<Self> {
        (values.len() == N_FEATURES).then_some(Self { values })
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// The six continuous columns.
    pub fn numeric(&self) -> ArrayView1<'_, f64> {
        self.values.slice(s![..N_NUMERIC])
    }

    /// The nine boolean columns.
    pub fn flags(&self) -> ArrayView1<'_, f64> {
        self.values.slice(s![N_NUMERIC..])
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        column_index(column).map(|i| self.values[i])
    }

    /// `(column, value)` pairs in schema order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Every one-hot group that does not have exactly one active flag.
    pub fn one_hot_violations(&self) -> Vec<ValidationError> {
        ONE_HOT_GROUPS
            .iter()
            .filter_map(|group| {
                let active = group
                    .columns
                    .iter()
                    .filter(|c| self.get(c).is_some_and(|v| v != 0.0))
                    .count();
                (active != 1).then_some(ValidationError {
                    group: group.name,
                    active,
                    size: group.columns.len(),
                })
            })
            .collect()
    }

    pub(crate) fn into_array(self) -> Array1<f64> {
        self.values
    }
}

/// Maps raw form values onto the schema.
///
/// The result is ordered by [`FEATURE_NAMES`], independent of the order the
/// inputs were supplied in. One-hot groups are not checked here; see
/// [`FeatureVector::one_hot_violations`].
///
/// # Errors
///
/// Returns `AssembleError::UnknownField` for a name outside the schema,
/// `AssembleError::MissingField` if any schema column is absent, and
/// `AssembleError::NotNumeric` / `AssembleError::NotBoolean` for values of the
/// wrong kind.
pub fn assemble(raw: &RawInputs) -> Result<FeatureVector, AssembleError> {
    if let Some((name, _)) = raw.iter().find(|(name, _)| column_index(name).is_none()) {
        return Err(AssembleError::UnknownField(name.to_string()));
    }

    let mut values = Array1::zeros(N_FEATURES);
    for (i, &name) in FEATURE_NAMES.iter().enumerate() {
        let value = raw
            .get(name)
            .ok_or_else(|| AssembleError::MissingField(name.to_string()))?;
        values[i] = if is_numeric(name) {
            value.as_number(name)?
        } else if value.as_flag(name)? {
            1.0
        } else {
            0.0
        };
    }
    Ok(FeatureVector { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn default_row() -> Array1<f64> {
        array![
            600.0, 30.0, 2.0, 8000.0, 2.0, 60000.0, // numeric
            0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0
        ]
    }

    #[test]
    fn test_defaults_assemble_to_default_vector() {
        let vector = assemble(&RawInputs::defaults()).unwrap();
        assert_eq!(vector.values(), default_row().view());
        assert!(vector.one_hot_violations().is_empty());
    }

    #[test]
    fn test_output_order_independent_of_input_order() {
        let mut pairs: Vec<(String, RawValue)> = RawInputs::defaults()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        for _ in 0..50 {
            pairs.shuffle(&mut rng);
            let raw: RawInputs = pairs.iter().cloned().collect();
            let vector = assemble(&raw).unwrap();
            assert_eq!(vector.values(), default_row().view());
            let names: Vec<&str> = vector.named().map(|(n, _)| n).collect();
            assert_eq!(names, FEATURE_NAMES.to_vec());
        }
    }

    #[test]
    fn test_accepts_integers_and_text() {
        let raw = RawInputs::defaults()
            .with("CreditScore", 710_i64)
            .with("Balance", " 1234.5 ")
            .with("Gender_Male", 0_i64)
            .with("Gender_Female", "True");
        let vector = assemble(&raw).unwrap();
        assert_eq!(vector.get("CreditScore"), Some(710.0));
        assert_eq!(vector.get("Balance"), Some(1234.5));
        assert_eq!(vector.get("Gender_Male"), Some(0.0));
        assert_eq!(vector.get("Gender_Female"), Some(1.0));
    }

    #[test]
    fn test_no_range_limit_on_numeric_fields() {
        let raw = RawInputs::defaults().with("Age", -4.0).with("EstimatedSalary", 1e9);
        let vector = assemble(&raw).unwrap();
        assert_eq!(vector.get("Age"), Some(-4.0));
        assert_eq!(vector.get("EstimatedSalary"), Some(1e9));
    }

    #[test]
    fn test_error_on_missing_field() {
        let mut raw = RawInputs::defaults();
        raw.remove("Tenure");
        assert_eq!(
            assemble(&raw),
            Err(AssembleError::MissingField("Tenure".to_string()))
        );
    }

    #[test]
    fn test_error_on_unknown_field() {
        let raw = RawInputs::defaults().with("Surname", "Hargrave");
        assert_eq!(
            assemble(&raw),
            Err(AssembleError::UnknownField("Surname".to_string()))
        );
    }

    #[test]
    fn test_error_on_wrong_kinds() {
        let raw = RawInputs::defaults().with("Age", "thirty");
        assert!(matches!(assemble(&raw), Err(AssembleError::NotNumeric { field, .. }) if field == "Age"));

        let raw = RawInputs::defaults().with("Age", true);
        assert!(matches!(assemble(&raw), Err(AssembleError::NotNumeric { .. })));

        let raw = RawInputs::defaults().with("Geography_Spain", 2_i64);
        assert!(matches!(
            assemble(&raw),
            Err(AssembleError::NotBoolean { field, .. }) if field == "Geography_Spain"
        ));
    }

    #[test]
    fn test_one_hot_violations_are_reported_per_group() {
        let raw = RawInputs::defaults()
            .with("Geography_France", false)
            .with("Gender_Female", true);
        let vector = assemble(&raw).unwrap();
        let violations = vector.one_hot_violations();
        assert_eq!(
            violations,
            vec![
                ValidationError { group: "Geography", active: 0, size: 3 },
                ValidationError { group: "Gender", active: 2, size: 2 },
            ]
        );
    }

    #[test]
    fn test_numeric_and_flag_views() {
        let vector = FeatureVector::from_array(default_row()).unwrap();
        assert_eq!(vector.numeric().len(), N_NUMERIC);
        assert_eq!(vector.flags().len(), N_FEATURES - N_NUMERIC);
        assert_eq!(vector.numeric()[0], 600.0);
        assert!(FeatureVector::from_array(array![1.0, 2.0]).is_none());
    }
}
