//! Zone Classifier
//!
//! `ZoneClassifier` is the seam the decision engine calls through; anything
//! deterministic that maps a feature vector to a zone label can sit behind it.
//!
//! `ForestClassifier` is the shipped implementation: a decision-tree ensemble
//! exported to JSON (`zone_classifier.json`). Each tree votes with the class
//! distribution of the leaf it reaches; the predicted zone is the argmax of
//! the averaged distributions, lowest class index on ties.

use crate::error::{PredictError, PredictResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fs;
use std::path::Path;

/// Number of model inputs: temperature, salinity, season code
pub const FEATURE_COUNT: usize = 3;

/// Model input vector `[temperature_degree_c, salinity_psu, season_code]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features(pub [f64; FEATURE_COUNT]);

impl Features {
    pub fn new(temperature: f64, salinity: f64, season_code: u32) -> Self {
        Features([temperature, salinity, f64::from(season_code)])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Pre-trained mapping from features to a zone label.
///
/// Implementations must be deterministic and safe to share across threads.
pub trait ZoneClassifier: Send + Sync {
    fn predict(&self, features: &Features) -> PredictResult<String>;

    /// Labels the classifier can emit
    fn classes(&self) -> &[String];
}

/// One node of a fitted tree. Leaves have no children and carry `value`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    /// Per-class sample counts (or weights) at this node
    #[serde(default)]
    pub value: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf; `x[feature] <= threshold` goes left
    fn leaf(&self, features: &Features) -> PredictResult<&TreeNode> {
        let mut idx = 0;
        // A valid tree reaches a leaf in at most `nodes.len()` steps
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| PredictError::Compute(format!("node index {} out of range", idx)))?;

            match (node.feature, node.threshold, node.left, node.right) {
                (Some(feature), Some(threshold), Some(left), Some(right)) => {
                    let x = features.0.get(feature).copied().ok_or_else(|| {
                        PredictError::Compute(format!("feature index {} out of range", feature))
                    })?;
                    idx = if x <= threshold { left } else { right };
                }
                _ => return Ok(node),
            }
        }
        Err(PredictError::Compute("tree traversal did not reach a leaf".to_string()))
    }

    fn validate(&self, class_count: usize) -> Result<()> {
        if self.nodes.is_empty() {
            anyhow::bail!("tree has no nodes");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match (node.feature, node.threshold, node.left, node.right) {
                (Some(feature), Some(_), Some(left), Some(right)) => {
                    if feature >= FEATURE_COUNT {
                        anyhow::bail!("node {} splits on feature {} (only {} features)", i, feature, FEATURE_COUNT);
                    }
                    if left >= self.nodes.len() || right >= self.nodes.len() {
                        anyhow::bail!("node {} has a child index out of range", i);
                    }
                }
                (None, None, None, None) => {
                    if node.value.len() != class_count {
                        anyhow::bail!(
                            "leaf {} has {} class weights, expected {}",
                            i, node.value.len(), class_count
                        );
                    }
                }
                _ => anyhow::bail!("node {} is neither a complete split nor a leaf", i),
            }
        }
        Ok(())
    }
}

/// Random-forest style ensemble loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForestClassifier {
    pub classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    /// Build and validate a forest
    pub fn new(classes: Vec<String>, trees: Vec<DecisionTree>) -> Result<Self> {
        let forest = Self { classes, trees };
        forest.validate()?;
        Ok(forest)
    }

    /// Load classifier from JSON artifact
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read zone classifier: {:?}", path))?;

        let forest: ForestClassifier = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse zone classifier JSON")?;

        forest
            .validate()
            .with_context(|| format!("Invalid zone classifier: {:?}", path))?;

        tracing::info!(
            "Loaded zone classifier ({} trees, classes: {})",
            forest.trees.len(),
            forest.classes.join(", ")
        );
        Ok(forest)
    }

    fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            anyhow::bail!("classifier has no classes");
        }
        if self.trees.is_empty() {
            anyhow::bail!("classifier has no trees");
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .with_context(|| format!("tree {}", i))?;
        }
        Ok(())
    }

    /// Averaged class probabilities across all trees
    pub fn predict_proba(&self, features: &Features) -> PredictResult<SmallVec<[f64; 8]>> {
        let mut totals: SmallVec<[f64; 8]> = SmallVec::from_elem(0.0, self.classes.len());

        for tree in &self.trees {
            let leaf = tree.leaf(features)?;
            let weight: f64 = leaf.value.iter().sum();
            if weight <= 0.0 {
                return Err(PredictError::Compute("leaf with zero total weight".to_string()));
            }
            for (total, v) in totals.iter_mut().zip(&leaf.value) {
                *total += v / weight;
            }
        }

        let n = self.trees.len() as f64;
        for total in totals.iter_mut() {
            *total /= n;
        }
        Ok(totals)
    }
}

impl ZoneClassifier for ForestClassifier {
    fn predict(&self, features: &Features) -> PredictResult<String> {
        if features.0.iter().any(|x| !x.is_finite()) {
            return Err(PredictError::Compute(format!("non-finite feature vector {:?}", features.0)));
        }

        let proba = self.predict_proba(features)?;

        // First maximum wins
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }

        self.classes.get(best).cloned().ok_or_else(|| {
            PredictError::Compute(format!(
                "class index {} out of range for {} classes",
                best,
                self.classes.len()
            ))
        })
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: &[f64]) -> TreeNode {
        TreeNode { feature: None, threshold: None, left: None, right: None, value: value.to_vec() }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode { feature: Some(feature), threshold: Some(threshold), left: Some(left), right: Some(right), value: vec![] }
    }

    fn classes() -> Vec<String> {
        vec!["Zone A".to_string(), "Zone B".to_string()]
    }

    /// temperature <= 10 -> A, else B
    fn stump() -> DecisionTree {
        DecisionTree { nodes: vec![split(0, 10.0, 1, 2), leaf(&[5.0, 0.0]), leaf(&[0.0, 5.0])] }
    }

    #[test]
    fn test_threshold_goes_left_inclusive() {
        let forest = ForestClassifier::new(classes(), vec![stump()]).unwrap();
        assert_eq!(forest.predict(&Features::new(10.0, 32.0, 0)).unwrap(), "Zone A");
        assert_eq!(forest.predict(&Features::new(10.01, 32.0, 0)).unwrap(), "Zone B");
    }

    #[test]
    fn test_votes_are_averaged() {
        // Second tree always leans A at 3:1
        let lean_a = DecisionTree { nodes: vec![leaf(&[3.0, 1.0])] };
        let forest = ForestClassifier::new(classes(), vec![stump(), lean_a]).unwrap();

        let proba = forest.predict_proba(&Features::new(20.0, 32.0, 0)).unwrap();
        approx::assert_abs_diff_eq!(proba[0], 0.375, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(proba[1], 0.625, epsilon = 1e-12);
        assert_eq!(forest.predict(&Features::new(20.0, 32.0, 0)).unwrap(), "Zone B");
    }

    #[test]
    fn test_tie_goes_to_first_class() {
        let even = DecisionTree { nodes: vec![leaf(&[1.0, 1.0])] };
        let forest = ForestClassifier::new(classes(), vec![even]).unwrap();
        assert_eq!(forest.predict(&Features::new(0.0, 0.0, 0)).unwrap(), "Zone A");
    }

    #[test]
    fn test_rejects_malformed_artifacts() {
        let bad_feature = DecisionTree { nodes: vec![split(3, 1.0, 1, 2), leaf(&[1.0, 0.0]), leaf(&[0.0, 1.0])] };
        assert!(ForestClassifier::new(classes(), vec![bad_feature]).is_err());

        let bad_child = DecisionTree { nodes: vec![split(0, 1.0, 1, 7), leaf(&[1.0, 0.0])] };
        assert!(ForestClassifier::new(classes(), vec![bad_child]).is_err());

        let short_leaf = DecisionTree { nodes: vec![leaf(&[1.0])] };
        assert!(ForestClassifier::new(classes(), vec![short_leaf]).is_err());

        assert!(ForestClassifier::new(classes(), vec![]).is_err());
    }

    #[test]
    fn test_cyclic_tree_is_compute_error() {
        // Passes structural validation but never reaches a leaf
        let cyclic = DecisionTree { nodes: vec![split(0, 1.0, 0, 0)] };
        let forest = ForestClassifier { classes: classes(), trees: vec![cyclic] };
        let err = forest.predict(&Features::new(0.0, 0.0, 0)).unwrap_err();
        assert_eq!(err.kind(), "compute");
    }

    #[test]
    fn test_unvalidated_forest_without_classes_is_compute_error() {
        let forest = ForestClassifier { classes: vec![], trees: vec![DecisionTree { nodes: vec![leaf(&[1.0])] }] };
        let err = forest.predict(&Features::new(1.0, 32.0, 0)).unwrap_err();
        assert_eq!(err.kind(), "compute");
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let forest = ForestClassifier::new(classes(), vec![stump()]).unwrap();
        let err = forest.predict(&Features::new(f64::NAN, 32.0, 0)).unwrap_err();
        assert_eq!(err.kind(), "compute");
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "classes": ["Zone A", "Zone B"],
            "trees": [{"nodes": [
                {"feature": 1, "threshold": 31.5, "left": 1, "right": 2},
                {"value": [4, 0]},
                {"value": [1, 3]}
            ]}]
        }"#;
        let forest: ForestClassifier = serde_json::from_str(json).unwrap();
        assert!(forest.validate().is_ok());
        assert_eq!(forest.predict(&Features::new(12.0, 32.0, 1)).unwrap(), "Zone B");
    }
}
