//! Train command - fits the codec and forest, publishes the bundle.

use std::path::Path;

use anyhow::{Context, Result};
use config::TrainConfig;
use tracing::info;

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if the snapshot is invalid or any pipeline step
/// fails; no bundle is published on failure.
pub fn run(dataset_path: &Path, bundle_path: &Path) -> Result<()> {
    let config = TrainConfig::from_env()?;
    info!(
        dataset = %dataset_path.display(),
        trees = config.n_trees,
        seed = config.seed,
        "Starting training"
    );

    let records = dataset::load_snapshot(dataset_path)
        .with_context(|| format!("load training snapshot {}", dataset_path.display()))?;
    info!(records = records.len(), "Loaded training snapshot");

    let output = pipeline::train(&records, &config)?;

    if let Some(parent) = bundle_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create bundle directory {}", parent.display()))?;
        }
    }
    output.bundle.save(bundle_path)?;

    match &output.metrics {
        Some(metrics) => info!(
            bundle = %bundle_path.display(),
            accuracy = metrics.holdout_accuracy,
            "Training complete"
        ),
        None => info!(bundle = %bundle_path.display(), "Training complete (no holdout)"),
    }

    Ok(())
}
