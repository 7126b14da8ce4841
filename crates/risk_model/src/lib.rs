//! Binary default-risk classifier.
//!
//! A seeded random forest over the codec's feature vectors: gini-split
//! decision trees fit on bootstrap samples, probabilities averaged across
//! trees. Fitting is deterministic for a fixed seed, and a fitted forest
//! is immutable and fully serializable.

mod forest;
mod tree;

pub use forest::*;
pub use tree::DecisionTree;
