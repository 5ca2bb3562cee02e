//! Shows how the logistic classifier reports bad parameters and bad rows
//! through `ModelError` instead of panicking.

use churnguard_helpers::{BinaryClassifier, ModelError};
use logistic::LogisticRegression;
use ndarray::array;

fn main() {
    println!("Logistic Classifier Error Handling Examples");
    println!("===========================================");

    println!("\n1. Rejecting a model without coefficients:");
    match LogisticRegression::<f64>::new(vec![], 0.0) {
        Ok(_) => println!("   Model created"),
        Err(e) => println!("   Caught expected error: {}", e),
    }

    println!("\n2. Scoring a row of the wrong width:");
    let model = match LogisticRegression::new(vec![0.8, -1.2], 0.1) {
        Ok(model) => model,
        Err(e) => {
            println!("   Failed to create model: {}", e);
            return;
        }
    };
    match model.predict(array![1.0, 2.0, 3.0].view()) {
        Err(ModelError::DimensionMismatch { expected, found }) => {
            println!("   Caught expected error: wanted {} columns, got {}", expected, found)
        }
        other => println!("   Unexpected result: {:?}", other),
    }

    println!("\n3. Successful prediction:");
    let row = array![1.5, 0.2];
    match (model.predict_proba(row.view()), model.predict(row.view())) {
        (Ok([p_retain, p_churn]), Ok(label)) => println!(
            "   label={} p_retain={:.3} p_churn={:.3}",
            label, p_retain, p_churn
        ),
        (Err(e), _) | (_, Err(e)) => println!("   Prediction failed: {}", e),
    }

    println!("\n4. Error propagation in functions:");
    fn churn_probability(row: &[f64]) -> Result<f64, ModelError> {
        let model = LogisticRegression::new(vec![0.5; 3], -0.2)?;
        let [_, p_churn] = model.predict_proba(ndarray::ArrayView1::from(row))?;
        Ok(p_churn)
    }
    match churn_probability(&[1.0, f64::NAN, 0.0]) {
        Ok(p) => println!("   p_churn = {}", p),
        Err(e) => println!("   Classification failed: {}", e),
    }
}
