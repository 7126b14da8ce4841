//! Offline training pipeline.
//!
//! Orchestrates the full flow: validate the snapshot, fit the feature
//! codec on the full corpus, transform, split with a pinned seed, fit the
//! forest, evaluate the holdout, and assemble the artifact bundle. Any
//! step failure aborts the run before anything is published.

mod split;

pub use split::{shuffle_split, SplitIndices};

use artifact::{ArtifactBundle, BundleMetadata, TrainingMetrics};
use chrono::Utc;
use config::TrainConfig;
use feature_codec::{CodecState, FeatureVector};
use risk_model::{ForestParams, RandomForest};
use risk_types::ClientRecord;
use tracing::info;

/// Result of a training run: the bundle plus its evaluation metrics.
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// The assembled, not-yet-persisted bundle.
    pub bundle: ArtifactBundle,
    /// Holdout metrics, when a holdout partition existed.
    pub metrics: Option<TrainingMetrics>,
}

/// Trains a scoring bundle on a labeled snapshot.
///
/// The codec is fit on the full corpus before splitting; the
/// forest is fit on the shuffled training partition only.
///
/// # Errors
///
/// Returns an error if the snapshot is unlabeled or malformed, the codec
/// rejects a record, or the forest cannot be fit. No partial bundle is
/// ever produced.
pub fn train(records: &[ClientRecord], config: &TrainConfig) -> anyhow::Result<TrainingOutput> {
    let labels = dataset::require_labels(records)?;

    info!(records = records.len(), "Fitting feature codec");
    let codec = CodecState::fit(records)?;
    let matrix = codec.transform_all(records)?;

    let split = shuffle_split(records.len(), config.test_fraction, config.seed);
    info!(
        train = split.train.len(),
        holdout = split.holdout.len(),
        seed = config.seed,
        "Split snapshot"
    );

    let (x_train, y_train) = select(&matrix, &labels, &split.train);
    let forest = RandomForest::fit(
        &x_train,
        &y_train,
        ForestParams {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            seed: config.seed,
        },
    )?;
    info!(trees = forest.n_trees(), "Fitted forest");

    let metrics = if split.holdout.is_empty() {
        None
    } else {
        let (x_holdout, y_holdout) = select(&matrix, &labels, &split.holdout);
        let metrics = evaluate(&forest, &x_holdout, &y_holdout);
        info!(
            accuracy = metrics.holdout_accuracy,
            default_rate = metrics.holdout_default_rate,
            n_holdout = metrics.n_holdout,
            "Holdout evaluation"
        );
        Some(metrics)
    };

    let bundle = ArtifactBundle::new(
        codec,
        forest,
        BundleMetadata {
            trained_at: Utc::now(),
            n_records: records.len(),
            n_train: split.train.len(),
            seed: config.seed,
            metrics: metrics.clone(),
        },
    );

    Ok(TrainingOutput { bundle, metrics })
}

/// Gathers the rows of a partition into owned vectors.
fn select(
    matrix: &[FeatureVector],
    labels: &[u8],
    indices: &[usize],
) -> (Vec<FeatureVector>, Vec<u8>) {
    let x = indices.iter().map(|&i| matrix[i]).collect();
    let y = indices.iter().map(|&i| labels[i]).collect();
    (x, y)
}

/// Computes holdout accuracy and default rate.
fn evaluate(forest: &RandomForest, x: &[FeatureVector], y: &[u8]) -> TrainingMetrics {
    let correct = x
        .iter()
        .zip(y)
        .filter(|(row, label)| forest.predict(row) == **label)
        .count();
    let defaults = y.iter().filter(|&&label| label == 1).count();

    TrainingMetrics {
        holdout_accuracy: correct as f64 / x.len() as f64,
        holdout_default_rate: defaults as f64 / x.len() as f64,
        n_holdout: x.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        id: u64,
        sector: &str,
        income: f64,
        ratio: f64,
        tenure: u32,
        mm: u8,
        label: u8,
    ) -> ClientRecord {
        ClientRecord {
            client_id: id,
            business_sector: sector.to_string(),
            monthly_income_fcfa: income,
            debt_to_income: ratio,
            tenure_months: tenure,
            mobile_money_score: mm,
            loan_status: Some(label),
        }
    }

    /// Cleanly separable corpus: every feature distinguishes the classes.
    fn corpus() -> Vec<ClientRecord> {
        let mut records = Vec::new();
        for i in 0..20u64 {
            records.push(record(
                i + 1,
                "Commerce",
                450_000.0 + i as f64 * 10_000.0,
                0.15 + i as f64 * 0.005,
                48 + i as u32,
                80 + (i % 15) as u8,
                0,
            ));
            records.push(record(
                i + 100,
                "Agriculture",
                100_000.0 + i as f64 * 1_000.0,
                0.70 + i as f64 * 0.005,
                2 + i as u32 / 4,
                10 + (i % 15) as u8,
                1,
            ));
        }
        records
    }

    fn fast_config() -> TrainConfig {
        TrainConfig {
            test_fraction: 0.2,
            seed: 42,
            n_trees: 25,
            max_depth: None,
        }
    }

    #[test]
    fn test_train_produces_versioned_bundle() {
        let output = train(&corpus(), &fast_config()).expect("train");
        assert_eq!(output.bundle.schema_version, artifact::BUNDLE_SCHEMA_VERSION);
        assert_eq!(output.bundle.metadata.n_records, 40);
        assert_eq!(output.bundle.metadata.n_train, 32);
        assert_eq!(output.bundle.metadata.seed, 42);
        assert_eq!(output.bundle.model.n_trees(), 25);
    }

    #[test]
    fn test_separable_corpus_scores_perfect_holdout() {
        let output = train(&corpus(), &fast_config()).expect("train");
        let metrics = output.metrics.expect("metrics");
        assert_eq!(metrics.n_holdout, 8);
        assert!((metrics.holdout_accuracy - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retrain_reproduces_the_model() {
        let records = corpus();
        let a = train(&records, &fast_config()).expect("train");
        let b = train(&records, &fast_config()).expect("train");
        assert_eq!(a.bundle.codec, b.bundle.codec);
        assert_eq!(a.bundle.model, b.bundle.model);
    }

    #[test]
    fn test_unlabeled_snapshot_aborts() {
        let mut records = corpus();
        records[3].loan_status = None;
        assert!(train(&records, &fast_config()).is_err());
    }
}
