//! Seeded train/holdout splitting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two partitions.
#[derive(Debug, Clone)]
pub struct SplitIndices {
    /// Rows the model is fit on.
    pub train: Vec<usize>,
    /// Rows held out for evaluation. May be empty for tiny corpora.
    pub holdout: Vec<usize>,
}

/// Shuffles `0..n` with a seeded rng and carves off the holdout fraction.
///
/// At least one row always remains in the training partition. The same
/// `(n, test_fraction, seed)` triple reproduces the same split, which the
/// retrain reproducibility depends on.
#[must_use]
pub fn shuffle_split(n: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_holdout = ((n as f64) * test_fraction).round() as usize;
    let n_holdout = n_holdout.min(n.saturating_sub(1));

    let train = indices.split_off(n_holdout);
    SplitIndices {
        train,
        holdout: indices,
    }
}
