//! Binary classifiers exported from the training run.
//!
//! Two model families are supported in JSON form: logistic regression
//! (coefficients + intercept) and random forests (flattened decision trees).
//! Both return a class label from `classes`, which defaults to `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Maps a scaled feature vector to a class label.
pub trait Classifier {
    /// Short name for display and logs.
    fn kind(&self) -> &'static str;

    /// Number of features the classifier expects, if known.
    fn width(&self) -> Option<usize>;

    /// Predict the class label for one feature vector.
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;

    /// Probability of the positive class, when the model exposes one.
    fn probability(&self, _features: &[f64]) -> Result<Option<f64>, ModelError> {
        Ok(None)
    }
}

/// Serialized classifier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ClassifierSpec {
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::LogisticRegression(m) => check_classes(&m.classes),
            Self::RandomForest(m) => m.validate(),
        }
    }
}

impl Classifier for ClassifierSpec {
    fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(m) => m.kind(),
            Self::RandomForest(m) => m.kind(),
        }
    }

    fn width(&self) -> Option<usize> {
        match self {
            Self::LogisticRegression(m) => m.width(),
            Self::RandomForest(m) => m.width(),
        }
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        match self {
            Self::LogisticRegression(m) => m.predict(features),
            Self::RandomForest(m) => m.predict(features),
        }
    }

    fn probability(&self, features: &[f64]) -> Result<Option<f64>, ModelError> {
        match self {
            Self::LogisticRegression(m) => m.probability(features),
            Self::RandomForest(m) => m.probability(features),
        }
    }
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

fn check_classes(classes: &[i64]) -> Result<(), ModelError> {
    if classes.len() != 2 {
        return Err(ModelError::Other(format!(
            "binary classifier needs 2 classes, got {}",
            classes.len()
        )));
    }
    Ok(())
}

// ── Logistic regression ──

/// Linear model: positive class when `w·x + b > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            classes: default_classes(),
        }
    }

    /// Signed distance to the decision boundary.
    pub fn decision(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::WidthMismatch {
                component: "classifier",
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let idx = usize::from(self.decision(features)? > 0.0);
        Ok(self.classes[idx])
    }

    fn probability(&self, features: &[f64]) -> Result<Option<f64>, ModelError> {
        let z = self.decision(features)?;
        Ok(Some(1.0 / (1.0 + (-z).exp())))
    }
}

// ── Random forest ──

/// One node of a flattened decision tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (counts or fractions) at this leaf.
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Class distribution of the leaf reached by `features`, normalized to sum 1.
    fn leaf_distribution(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).ok_or(ModelError::WidthMismatch {
                        component: "classifier",
                        expected: feature + 1,
                        actual: features.len(),
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    return Ok(if total > 0.0 {
                        value.iter().map(|v| v / total).collect()
                    } else {
                        value.clone()
                    });
                }
            }
        }
    }
}

/// Averaged-probability forest of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
    #[serde(default)]
    pub n_features: Option<usize>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

impl RandomForest {
    /// Check tree structure: non-empty, children in range and after their
    /// parent (so every walk terminates), leaves sized to the class list.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err(ModelError::Other("random forest has no trees".into()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            let invalid = |reason: String| ModelError::InvalidTree { tree: t, reason };
            if tree.nodes.is_empty() {
                return Err(invalid("no nodes".into()));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(invalid(format!(
                                    "node {i} has out-of-order child {child}"
                                )));
                            }
                        }
                        if let Some(n) = self.n_features
                            && *feature >= n
                        {
                            return Err(invalid(format!(
                                "node {i} splits on feature {feature}, model has {n}"
                            )));
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(invalid(format!(
                                "leaf {i} has {} class weights, expected {}",
                                value.len(),
                                self.classes.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Mean of the per-tree leaf distributions.
    pub fn distribution(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if let Some(n) = self.n_features
            && n != features.len()
        {
            return Err(ModelError::WidthMismatch {
                component: "classifier",
                expected: n,
                actual: features.len(),
            });
        }

        let mut sum = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            let dist = tree.leaf_distribution(features)?;
            for (acc, p) in sum.iter_mut().zip(dist) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        for v in &mut sum {
            *v /= n;
        }
        Ok(sum)
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn width(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let dist = self.distribution(features)?;
        Ok(self.classes[argmax(&dist)])
    }

    fn probability(&self, features: &[f64]) -> Result<Option<f64>, ModelError> {
        Ok(self.distribution(features)?.get(1).copied())
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
