//! Random forest ensemble over decision trees.

use feature_codec::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_types::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::DecisionTree;

/// Errors raised while fitting the forest.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No training rows were supplied.
    #[error("cannot fit a forest on an empty training set")]
    EmptyTrainingSet,

    /// Feature matrix and label vector disagree in length.
    #[error("feature matrix has {features} rows but label vector has {labels}")]
    LabelLengthMismatch { features: usize, labels: usize },
}

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Optional per-tree depth cap; `None` grows to purity.
    pub max_depth: Option<usize>,
    /// Seed for bootstrap sampling and feature subsetting.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: None,
            seed: 42,
        }
    }
}

/// A fitted random forest for binary default classification.
///
/// Immutable after fit. The probability of default for a vector is the
/// mean positive-class fraction across all tree leaves it reaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    params: ForestParams,
}

impl RandomForest {
    /// Fits the forest on a transformed feature matrix and binary labels.
    ///
    /// Tree `t` draws its bootstrap sample and feature subsets from a rng
    /// seeded with `seed + t`, so a refit with the same data and params
    /// reproduces the ensemble exactly.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the training set is empty or labels do
    /// not line up with the feature rows.
    pub fn fit(x: &[FeatureVector], y: &[u8], params: ForestParams) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::LabelLengthMismatch {
                features: x.len(),
                labels: y.len(),
            });
        }

        let features_per_split = features_per_split();
        let trees = (0..params.n_trees)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let bootstrap: Vec<usize> =
                    (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
                DecisionTree::fit(x, y, bootstrap, params.max_depth, features_per_split, &mut rng)
            })
            .collect();

        Ok(Self { trees, params })
    }

    /// Probability of default in [0, 1] for one feature vector.
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_proba(features))
            .sum();
        sum / self.trees.len() as f64
    }

    /// Majority-vote class label: 1 (default) when the probability reaches 0.5.
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> u8 {
        u8::from(self.predict_proba(features) >= 0.5)
    }

    /// Number of trees in the fitted ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Hyperparameters the forest was fit with.
    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Features considered per split: floor(sqrt(feature count)), at least one.
fn features_per_split() -> usize {
    let m = (FEATURE_COUNT as f64).sqrt().floor() as usize;
    m.max(1)
}
