use churnguard::features::{DEFAULT_FLAGS, DEFAULT_NUMERIC};
use churnguard::{RawInputs, RawValue, BOOLEAN_FEATURES, N_FEATURES, N_NUMERIC, NUMERIC_FEATURES};

/// Numeric columns the form edits as whole numbers.
const INTEGER_FIELDS: [&str; 4] = ["CreditScore", "Age", "Tenure", "NumOfProducts"];

/// The values currently shown in the form widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub numeric: [f64; N_NUMERIC],
    pub flags: [bool; N_FEATURES - N_NUMERIC],
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            numeric: DEFAULT_NUMERIC,
            flags: DEFAULT_FLAGS,
        }
    }
}

impl FormState {
    pub fn is_integer(field: &str) -> bool {
        INTEGER_FIELDS.contains(&field)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One raw value per schema column, keyed by column name.
    pub fn to_raw_inputs(&self) -> RawInputs {
        let numeric = NUMERIC_FEATURES.iter().zip(self.numeric).map(|(name, value)| {
            let raw = if Self::is_integer(name) {
                RawValue::Integer(value.round() as i64)
            } else {
                RawValue::Real(value)
            };
            (name.to_string(), raw)
        });
        let flags = BOOLEAN_FEATURES
            .iter()
            .zip(self.flags)
            .map(|(name, flag)| (name.to_string(), RawValue::Flag(flag)));
        numeric.chain(flags).collect()
    }
}
