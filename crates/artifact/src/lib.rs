//! Versioned artifact bundle coupling the training pipeline to serving.
//!
//! The bundle is the only artifact the two sides share: codec state, the
//! fitted forest, and training metadata, serialized together in one JSON
//! document. Publishing is atomic (temp file + rename), so a scoring
//! service starting mid-train never observes a partial bundle.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use feature_codec::CodecState;
use risk_model::RandomForest;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Bundle layout version compiled into both producer and consumer.
///
/// Loaders reject any other value rather than guessing at field meaning.
pub const BUNDLE_SCHEMA_VERSION: u32 = 1;

/// Errors raised while loading a bundle.
///
/// `NotFound` is an expected operational state (model not yet trained) and
/// must be reported, never treated as a crash.
#[derive(Debug, Error)]
pub enum BundleLoadError {
    /// No bundle exists at the given path.
    #[error("no artifact bundle at {path} (model not yet trained?)")]
    NotFound { path: String },

    /// The file exists but is not a parseable bundle.
    #[error("artifact bundle at {path} is corrupt")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The bundle was produced under a different layout version.
    #[error("artifact bundle schema version {found} does not match expected {expected}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    /// The file could not be read.
    #[error("failed to read artifact bundle at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Held-out evaluation metrics recorded at training time.
///
/// Regression signal for retrains, not a correctness requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Fraction of held-out records classified correctly.
    pub holdout_accuracy: f64,
    /// Fraction of held-out records labeled as defaults.
    pub holdout_default_rate: f64,
    /// Held-out partition size.
    pub n_holdout: usize,
}

/// Provenance metadata recorded alongside the fitted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// When training completed.
    pub trained_at: DateTime<Utc>,
    /// Total records in the training snapshot.
    pub n_records: usize,
    /// Records in the fit partition.
    pub n_train: usize,
    /// Seed the split and forest were drawn from.
    pub seed: u64,
    /// Held-out metrics, when an evaluation partition existed.
    pub metrics: Option<TrainingMetrics>,
}

/// The persisted tuple of codec state, model, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBundle {
    /// Layout version, checked on load.
    pub schema_version: u32,
    /// Fitted feature codec (categorical codes + scaler statistics).
    pub codec: CodecState,
    /// Fitted classifier.
    pub model: RandomForest,
    /// Training provenance.
    pub metadata: BundleMetadata,
}

impl ArtifactBundle {
    /// Assembles a bundle at the current schema version.
    #[must_use]
    pub fn new(codec: CodecState, model: RandomForest, metadata: BundleMetadata) -> Self {
        Self {
            schema_version: BUNDLE_SCHEMA_VERSION,
            codec,
            model,
            metadata,
        }
    }

    /// Persists the bundle to `path` with an atomic publish.
    ///
    /// The document is written to a sibling temp file first and renamed
    /// into place, so readers only ever see a complete bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails; on
    /// failure the previous bundle at `path`, if any, is left untouched.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let document = serde_json::to_string(self).context("serialize artifact bundle")?;

        let file_name = path
            .file_name()
            .context("bundle path has no file name")?
            .to_string_lossy();
        let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

        std::fs::write(&tmp_path, document)
            .with_context(|| format!("write bundle to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("publish bundle to {}", path.display()))?;

        info!(path = %path.display(), "Published artifact bundle");
        Ok(())
    }

    /// Loads and version-checks a bundle from `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleLoadError`] distinguishing the missing, corrupt,
    /// unreadable, and version-mismatched cases.
    pub fn load(path: &Path) -> Result<Self, BundleLoadError> {
        let display = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BundleLoadError::NotFound {
                    path: display.clone(),
                }
            } else {
                BundleLoadError::Io {
                    path: display.clone(),
                    source,
                }
            }
        })?;

        // Sniff the version before the full typed parse: a layout change
        // must surface as a version mismatch, not a confusing parse error.
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| BundleLoadError::Corrupt {
                path: display.clone(),
                source,
            })?;
        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .map_or(0, |v| v as u32);
        if found != BUNDLE_SCHEMA_VERSION {
            return Err(BundleLoadError::SchemaVersionMismatch {
                expected: BUNDLE_SCHEMA_VERSION,
                found,
            });
        }

        serde_json::from_value(value).map_err(|source| BundleLoadError::Corrupt {
            path: display,
            source,
        })
    }
}
