//! Decision-tree ensembles for binary classification.
//!
//! Trees are stored as flat node arrays. A split sends a row left when
//! `row[feature] <= threshold`. Children always sit after their parent in the
//! array, so a traversal can only move forward and always reaches a leaf.

use churnguard_helpers::{check_dimension, BinaryClassifier, Float, ModelError};
use ndarray::ArrayView1;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// How per-tree leaf values are combined into a class-1 probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
pub enum Aggregation {
    /// Leaves hold class-1 probabilities; the forest averages them (random forest).
    Averaged,
    /// Leaves hold additive margins; the forest sums them onto a base score and
    /// applies the logistic function (gradient boosting).
    Boosted,
}

/// A node in a decision tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
pub enum Node<F: Float> {
    /// Internal split node
    Split {
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
    },
    /// Leaf node with a value
    Leaf(F),
}

/// A single decision tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Tree<F: Float> {
    nodes: Vec<Node<F>>,
}

impl<F: Float> Tree<F> {
    pub fn new(nodes: Vec<Node<F>>) -> Self {
        Self { nodes }
    }

    /// A tree with a single leaf.
    pub fn stump(value: F) -> Self {
        Self {
            nodes: vec![Node::Leaf(value)],
        }
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }

    fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidModel("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ModelError::InvalidModel(format!(
                            "node {} splits on feature {} but the model has {} features",
                            i, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::InvalidModel(format!(
                            "node {} has a non-finite threshold",
                            i
                        )));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ModelError::InvalidModel(format!(
                                "node {} points to invalid child {}",
                                i, child
                            )));
                        }
                    }
                }
                Node::Leaf(value) => {
                    if !value.is_finite() {
                        return Err(ModelError::InvalidModel(format!(
                            "leaf {} has a non-finite value",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks the tree for `row` and returns the leaf value it lands on.
    ///
    /// The row must already have been checked against the model's width.
    fn leaf_value(&self, row: ArrayView1<F>) -> F {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// An ensemble of decision trees over a fixed number of features.
///
/// Deserializing runs the same checks as [`Forest::new`], so a forest can
/// never hold a tree whose traversal leaves its node array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(
        crate = "serde_crate",
        try_from = "ForestParts<F>",
        bound(deserialize = "F: Deserialize<'de>")
    )
)]
pub struct Forest<F: Float> {
    aggregation: Aggregation,
    base_score: F,
    n_features: usize,
    trees: Vec<Tree<F>>,
}

/// Unchecked serialized form of a [`Forest`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(crate = "serde_crate")]
struct ForestParts<F: Float> {
    aggregation: Aggregation,
    #[serde(default)]
    base_score: F,
    n_features: usize,
    trees: Vec<Tree<F>>,
}

#[cfg(feature = "serde")]
impl<F: Float> TryFrom<ForestParts<F>> for Forest<F> {
    type Error = ModelError;

    fn try_from(parts: ForestParts<F>) -> Result<Self, Self::Error> {
        Forest::new(parts.aggregation, parts.base_score, parts.n_features, parts.trees)
    }
}

impl<F: Float> Forest<F> {
    /// Creates a forest and checks its structure.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidModel` if the forest has no trees, a tree is
    /// empty, a split refers to a feature outside `0..n_features`, a child index
    /// does not point forward inside its tree, a value is not finite, or an
    /// averaged forest has a leaf outside `[0, 1]`.
    pub fn new(
        aggregation: Aggregation,
        base_score: F,
        n_features: usize,
        trees: Vec<Tree<F>>,
    ) -> Result<Self, ModelError> {
        let forest = Self {
            aggregation,
            base_score,
            n_features,
            trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    /// Checks the structure of the forest. Always `Ok` for a forest built by
    /// [`Forest::new`] or deserialized.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(ModelError::InvalidModel("forest has zero features".into()));
        }
        if self.trees.is_empty() {
            return Err(ModelError::InvalidModel("forest has no trees".into()));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::InvalidModel("non-finite base score".into()));
        }
        for tree in &self.trees {
            tree.validate(self.n_features)?;
        }
        if self.aggregation == Aggregation::Averaged {
            let out_of_range = self.trees.iter().flat_map(|t| t.nodes.iter()).any(|n| {
                matches!(*n, Node::Leaf(v) if v < F::zero() || v > F::one())
            });
            if out_of_range {
                return Err(ModelError::InvalidModel(
                    "averaged forest leaves must be probabilities".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Class-1 probability for a row.
    pub fn churn_probability(&self, features: ArrayView1<F>) -> Result<F, ModelError> {
        check_dimension(features, self.n_features)?;
        let total: F = self.trees.iter().map(|t| t.leaf_value(features)).sum();
        let p = match self.aggregation {
            Aggregation::Averaged => total / F::cast(self.trees.len()).unwrap_or_else(F::one),
            Aggregation::Boosted => (self.base_score + total).sigmoid(),
        };
        Ok(p)
    }
}

impl<F: Float> BinaryClassifier<F> for Forest<F> {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: ArrayView1<F>) -> Result<[F; 2], ModelError> {
        let p_churn = self.churn_probability(features)?;
        Ok([F::one() - p_churn, p_churn])
    }

    /// Argmax over the class distribution; a tie goes to class 0.
    fn predict(&self, features: ArrayView1<F>) -> Result<usize, ModelError> {
        let [p_retain, p_churn] = self.predict_proba(features)?;
        Ok(usize::from(p_churn > p_retain))
    }

    fn name(&self) -> String {
        let kind = match self.aggregation {
            Aggregation::Averaged => "Random forest",
            Aggregation::Boosted => "Gradient boosted trees",
        };
        format!("{} ({} trees)", kind, self.trees.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    /// Splits on feature 0 at 0.5, then on feature 1 at 0.3 on the right side.
    fn two_level_tree(left: f64, right_low: f64, right_high: f64) -> Tree<f64> {
        Tree::new(vec![
            Node::Split { feature: 0, threshold: 0.5, left: 1, right: 2 },
            Node::Leaf(left),
            Node::Split { feature: 1, threshold: 0.3, left: 3, right: 4 },
            Node::Leaf(right_low),
            Node::Leaf(right_high),
        ])
    }

    fn averaged_forest() -> Forest<f64> {
        Forest::new(
            Aggregation::Averaged,
            0.0,
            2,
            vec![two_level_tree(0.1, 0.25, 0.9), two_level_tree(0.3, 0.75, 0.7)],
        )
        .unwrap()
    }

    #[test]
    fn test_averaged_probabilities() {
        let forest = averaged_forest();
        assert_abs_diff_eq!(forest.churn_probability(array![0.2, 0.0].view()).unwrap(), 0.2);
        assert_abs_diff_eq!(forest.churn_probability(array![0.5, 0.0].view()).unwrap(), 0.2);
        assert_abs_diff_eq!(forest.churn_probability(array![0.8, 0.1].view()).unwrap(), 0.5);
        assert_abs_diff_eq!(forest.churn_probability(array![0.8, 0.9].view()).unwrap(), 0.8);
    }

    #[test]
    fn test_tie_predicts_class_zero() {
        let forest = averaged_forest();
        assert_eq!(forest.predict(array![0.8, 0.1].view()).unwrap(), 0);
        assert_eq!(forest.predict(array![0.8, 0.9].view()).unwrap(), 1);
    }

    #[test]
    fn test_boosted_probabilities() {
        let forest = Forest::new(
            Aggregation::Boosted,
            -0.5,
            2,
            vec![two_level_tree(-1.0, 0.25, 1.0), Tree::stump(0.5)],
        )
        .unwrap();
        let p = forest.churn_probability(array![0.9, 0.9].view()).unwrap();
        assert_abs_diff_eq!(p, 1.0_f64.sigmoid(), epsilon = 1e-12);
        let p = forest.churn_probability(array![0.0, 0.0].view()).unwrap();
        assert_abs_diff_eq!(p, (-1.0_f64).sigmoid(), epsilon = 1e-12);
    }

    #[test]
    fn test_label_agrees_with_probabilities_on_random_rows() {
        let forest = averaged_forest();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for _ in 0..500 {
            let row: Array1<f64> = (0..2).map(|_| rng.random_range(-1.0..2.0)).collect();
            let [p_retain, p_churn] = forest.predict_proba(row.view()).unwrap();
            assert_abs_diff_eq!(p_retain + p_churn, 1.0, epsilon = 1e-12);
            assert_eq!(forest.predict(row.view()).unwrap() == 1, p_churn > p_retain);
        }
    }

    #[test]
    fn test_error_on_wrong_width() {
        let forest = averaged_forest();
        assert!(matches!(
            forest.predict(array![0.1].view()),
            Err(ModelError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_error_on_backward_child() {
        let tree = Tree::new(vec![
            Node::Split { feature: 0, threshold: 0.5, left: 1, right: 2 },
            Node::Leaf(0.1),
            Node::Split { feature: 0, threshold: 0.2, left: 1, right: 3 },
            Node::Leaf(0.4),
        ]);
        assert!(Forest::new(Aggregation::Averaged, 0.0, 1, vec![tree]).is_err());
    }

    #[test]
    fn test_error_on_structural_problems() {
        assert!(Forest::<f64>::new(Aggregation::Boosted, 0.0, 2, vec![]).is_err());
        assert!(Forest::<f64>::new(Aggregation::Boosted, 0.0, 2, vec![Tree::new(vec![])]).is_err());
        let out_of_range_feature = two_level_tree(0.1, 0.2, 0.3);
        assert!(Forest::new(Aggregation::Averaged, 0.0, 1, vec![out_of_range_feature]).is_err());
        assert!(Forest::new(Aggregation::Averaged, 0.0, 2, vec![Tree::stump(1.5)]).is_err());
        assert!(Forest::new(Aggregation::Boosted, 0.0, 2, vec![Tree::stump(1.5)]).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_broken_trees() {
        let backward_child = r#"{
            "aggregation": "boosted",
            "n_features": 1,
            "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0.5, "left": 1, "right": 2}},
                {"leaf": 0.1},
                {"split": {"feature": 0, "threshold": 0.2, "left": 1, "right": 3}},
                {"leaf": 0.4}
            ]}]
        }"#;
        let err = serde_json::from_str::<Forest<f64>>(backward_child).unwrap_err();
        assert!(err.to_string().contains("invalid child 1"));

        let child_past_end = r#"{
            "aggregation": "boosted",
            "n_features": 1,
            "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0.5, "left": 1, "right": 7}},
                {"leaf": 0.1}
            ]}]
        }"#;
        assert!(serde_json::from_str::<Forest<f64>>(child_past_end).is_err());

        let feature_out_of_range = r#"{
            "aggregation": "averaged",
            "n_features": 1,
            "trees": [{"nodes": [
                {"split": {"feature": 3, "threshold": 0.5, "left": 1, "right": 2}},
                {"leaf": 0.1},
                {"leaf": 0.9}
            ]}]
        }"#;
        assert!(serde_json::from_str::<Forest<f64>>(feature_out_of_range).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_valid_forest() {
        let json = r#"{
            "aggregation": "averaged",
            "n_features": 2,
            "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0.5, "left": 1, "right": 2}},
                {"leaf": 0.1},
                {"leaf": 0.9}
            ]}]
        }"#;
        let forest: Forest<f64> = serde_json::from_str(json).unwrap();
        assert_eq!(forest.n_trees(), 1);
        assert_abs_diff_eq!(forest.churn_probability(array![0.7, 0.0].view()).unwrap(), 0.9);
        let back: Forest<f64> = serde_json::from_str(&serde_json::to_string(&forest).unwrap()).unwrap();
        assert_eq!(back, forest);
    }
}
