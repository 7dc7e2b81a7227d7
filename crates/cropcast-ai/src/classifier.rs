//! Fitted classifiers over label-encoded feature vectors.
//!
//! Two persisted model kinds are supported:
//!
//! - [`ForestModel`]: an ensemble of decision trees. Class probabilities are
//!   the mean of each tree's normalised leaf weights; the prediction is the
//!   most probable class.
//! - [`CentroidModel`]: nearest centroid by squared Euclidean distance. It has
//!   no probability estimate.
//!
//! Anything implementing [`Classifier`] can be placed in a
//! [`ModelArtifact`](crate::ModelArtifact).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("split on feature {feature} but sample has {n_features} features")]
    FeatureOutOfRange { feature: usize, n_features: usize },

    #[error("leaf carries {got} class weights, model has {expected} classes")]
    LeafWidth { expected: usize, got: usize },

    #[error("leaf weights do not sum to a positive finite value")]
    DegenerateLeaf,

    #[error("leaf weight {0} is negative or not finite")]
    InvalidWeight(f32),

    #[error("centroid {index} has dimension {got}, expected {expected}")]
    RaggedCentroids {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("model has no trees or centroids")]
    EmptyModel,

    #[error("classifier does not expose probability estimates")]
    ProbabilityUnsupported,
}

/// A fitted single-output classifier.
///
/// `features` is one sample: the encoded categorical codes in the variant's
/// feature order.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Feature-vector width the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predicted class index for one sample.
    fn predict(&self, features: &[f32]) -> Result<usize, ClassifierError>;

    /// Per-class probabilities for one sample, where supported.
    fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        Err(ClassifierError::ProbabilityUnsupported)
    }
}

/// Persisted classifier, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FittedModel {
    Forest(ForestModel),
    Centroid(CentroidModel),
}

impl FittedModel {
    /// Structural checks that do not depend on any input sample. A model
    /// that passes can only fail at predict time on a wrong-width sample.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        match self {
            Self::Forest(m) => m.validate(),
            Self::Centroid(m) => m.validate(),
        }
    }

    /// Number of classes the model can predict.
    pub fn n_classes(&self) -> usize {
        match self {
            Self::Forest(m) => m.n_classes,
            Self::Centroid(m) => m.centroids.len(),
        }
    }
}

impl Classifier for FittedModel {
    fn n_features(&self) -> usize {
        match self {
            Self::Forest(m) => m.n_features(),
            Self::Centroid(m) => m.n_features(),
        }
    }

    fn predict(&self, features: &[f32]) -> Result<usize, ClassifierError> {
        match self {
            Self::Forest(m) => m.predict(features),
            Self::Centroid(m) => m.predict(features),
        }
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        match self {
            Self::Forest(m) => m.predict_proba(features),
            Self::Centroid(m) => m.predict_proba(features),
        }
    }
}

// ── Decision forest ──

/// One node of a fitted decision tree.
///
/// Split nodes send a sample left when `features[feature] <= threshold`.
/// Leaves carry per-class weights (sample counts or fractions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: Vec<f32>,
    },
}

impl TreeNode {
    pub fn leaf(value: Vec<f32>) -> Self {
        Self::Leaf { value }
    }

    pub fn split(feature: usize, threshold: f32, left: TreeNode, right: TreeNode) -> Self {
        Self::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Walk to the leaf this sample lands in.
    fn leaf_for(&self, features: &[f32]) -> Result<&[f32], ClassifierError> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { value } => return Ok(value.as_slice()),
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).ok_or(ClassifierError::FeatureOutOfRange {
                        feature: *feature,
                        n_features: features.len(),
                    })?;
                    node = if *x <= *threshold { &**left } else { &**right };
                }
            }
        }
    }
}

/// Ensemble of decision trees voting by averaged leaf distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<TreeNode>,
}

impl ForestModel {
    /// Walk every node: splits must reference a fitted feature, leaves must
    /// carry `n_classes` finite, non-negative weights with a positive sum.
    fn validate(&self) -> Result<(), ClassifierError> {
        self.check_non_empty()?;
        let mut pending: Vec<&TreeNode> = self.trees.iter().collect();
        while let Some(node) = pending.pop() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(ClassifierError::FeatureOutOfRange {
                            feature: *feature,
                            n_features: self.n_features,
                        });
                    }
                    pending.push(left);
                    pending.push(right);
                }
                TreeNode::Leaf { value } => {
                    self.check_leaf(value)?;
                }
            }
        }
        Ok(())
    }

    fn check_non_empty(&self) -> Result<(), ClassifierError> {
        if self.trees.is_empty() || self.n_classes == 0 {
            return Err(ClassifierError::EmptyModel);
        }
        Ok(())
    }

    /// Returns the leaf's weight total.
    fn check_leaf(&self, leaf: &[f32]) -> Result<f32, ClassifierError> {
        if leaf.len() != self.n_classes {
            return Err(ClassifierError::LeafWidth {
                expected: self.n_classes,
                got: leaf.len(),
            });
        }
        if let Some(&w) = leaf.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(ClassifierError::InvalidWeight(w));
        }
        let total: f32 = leaf.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(ClassifierError::DegenerateLeaf);
        }
        Ok(total)
    }

    fn check_width(&self, features: &[f32]) -> Result<(), ClassifierError> {
        if features.len() != self.n_features {
            return Err(ClassifierError::FeatureCount {
                expected: self.n_features,
                got: features.len(),
            });
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> Result<usize, ClassifierError> {
        let proba = self.predict_proba(features)?;
        argmax(&proba).ok_or(ClassifierError::EmptyModel)
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        self.check_non_empty()?;
        self.check_width(features)?;

        let mut proba = vec![0.0f32; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf_for(features)?;
            let total = self.check_leaf(leaf)?;
            for (p, &w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f32;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }
}

// ── Nearest centroid ──

/// Nearest-centroid classifier. Class `i` is `centroids[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Vec<f32>>,
}

impl CentroidModel {
    fn validate(&self) -> Result<(), ClassifierError> {
        let first = self.centroids.first().ok_or(ClassifierError::EmptyModel)?;
        let expected = first.len();
        for (index, c) in self.centroids.iter().enumerate() {
            if c.len() != expected {
                return Err(ClassifierError::RaggedCentroids {
                    index,
                    expected,
                    got: c.len(),
                });
            }
        }
        Ok(())
    }
}

impl Classifier for CentroidModel {
    fn n_features(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }

    fn predict(&self, features: &[f32]) -> Result<usize, ClassifierError> {
        self.validate()?;
        let expected = self.n_features();
        if features.len() != expected {
            return Err(ClassifierError::FeatureCount {
                expected,
                got: features.len(),
            });
        }

        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let dist = squared_distance(features, centroid);
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        Ok(best)
    }
}

/// Index of the largest value; the lowest index wins ties.
fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
