//! Gini-split decision tree over fixed-length feature vectors.

use std::cmp::Ordering;

use feature_codec::FeatureVector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use risk_types::FEATURE_COUNT;
use serde::{Deserialize, Serialize};

/// A node in the tree arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    /// Terminal node holding the fraction of positive (default) samples.
    Leaf { probability: f64 },
    /// Internal split: `feature <= threshold` descends left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single fitted decision tree.
///
/// Nodes live in a flat arena indexed from the root at 0, which keeps the
/// structure trivially serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fits a tree on the rows of `x` selected by `samples`.
    ///
    /// `samples` is a bootstrap index set and may repeat rows. Each split
    /// considers a random subset of `features_per_split` features drawn
    /// from the caller's seeded rng.
    pub(crate) fn fit(
        x: &[FeatureVector],
        y: &[u8],
        samples: Vec<usize>,
        max_depth: Option<usize>,
        features_per_split: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = Vec::new();
        build(
            &mut nodes,
            x,
            y,
            samples,
            0,
            max_depth,
            features_per_split,
            rng,
        );
        Self { nodes }
    }

    /// Returns the positive-class fraction at the leaf this vector lands in.
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { probability } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Recursively grows the tree, returning the arena index of the new node.
#[allow(clippy::too_many_arguments)]
fn build(
    nodes: &mut Vec<Node>,
    x: &[FeatureVector],
    y: &[u8],
    samples: Vec<usize>,
    depth: usize,
    max_depth: Option<usize>,
    features_per_split: usize,
    rng: &mut StdRng,
) -> usize {
    let positives = samples.iter().filter(|&&i| y[i] == 1).count();
    let probability = positives as f64 / samples.len() as f64;

    let pure = positives == 0 || positives == samples.len();
    let capped = max_depth.is_some_and(|cap| depth >= cap);
    if pure || capped || samples.len() < 2 {
        nodes.push(Node::Leaf { probability });
        return nodes.len() - 1;
    }

    let Some(split) = best_split(x, y, &samples, features_per_split, rng) else {
        // No impurity-reducing boundary exists, e.g. duplicate rows with
        // mixed labels.
        nodes.push(Node::Leaf { probability });
        return nodes.len() - 1;
    };

    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
        .into_iter()
        .partition(|&i| x[i][split.feature] <= split.threshold);

    // Reserve the parent slot before recursing so child indices are known.
    let index = nodes.len();
    nodes.push(Node::Leaf { probability });
    let left = build(
        nodes,
        x,
        y,
        left_samples,
        depth + 1,
        max_depth,
        features_per_split,
        rng,
    );
    let right = build(
        nodes,
        x,
        y,
        right_samples,
        depth + 1,
        max_depth,
        features_per_split,
        rng,
    );
    nodes[index] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    index
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Finds the lowest-impurity split over a random feature subset.
///
/// Candidate thresholds are midpoints between consecutive distinct values,
/// so ties in a feature never produce a degenerate empty partition.
fn best_split(
    x: &[FeatureVector],
    y: &[u8],
    samples: &[usize],
    features_per_split: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let mut feature_order: Vec<usize> = (0..FEATURE_COUNT).collect();
    feature_order.shuffle(rng);
    let candidates = &feature_order[..features_per_split.min(FEATURE_COUNT)];

    let total = samples.len();
    let total_pos = samples.iter().filter(|&&i| y[i] == 1).count();
    let parent_impurity = gini(total_pos, total);

    let mut best: Option<SplitCandidate> = None;
    for &feature in candidates {
        let mut order = samples.to_vec();
        order.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_pos = 0;
        for boundary in 0..total - 1 {
            if y[order[boundary]] == 1 {
                left_pos += 1;
            }
            let low = x[order[boundary]][feature];
            let high = x[order[boundary + 1]][feature];
            if low == high {
                continue;
            }

            let left_n = boundary + 1;
            let right_n = total - left_n;
            let right_pos = total_pos - left_pos;
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(right_pos, right_n))
                / total as f64;

            let improves = impurity < parent_impurity - 1e-12
                && best.as_ref().map_or(true, |b| impurity < b.impurity);
            if improves {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (low + high) / 2.0,
                    impurity,
                });
            }
        }
    }
    best
}

/// Gini impurity of a binary sample count.
fn gini(positives: usize, total: usize) -> f64 {
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}
