//! The service handle: bundle + snapshot index + policy.

use std::collections::HashMap;
use std::path::Path;

use artifact::{ArtifactBundle, BundleLoadError};
use config::RiskPolicy;
use feature_codec::CodecError;
use risk_types::{ClientRecord, Decision, RiskReport, RiskTier};
use thiserror::Error;
use tracing::{debug, info};

use crate::rationale::rationale_for;

/// Per-query errors. Both are expected, recoverable conditions that leave
/// the handle fully usable for the next query.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The id has no record in the current snapshot.
    #[error("client {0} not found in the current data snapshot")]
    ClientNotFound(u64),

    /// The record failed codec transformation (unseen category or
    /// out-of-range attribute).
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// An owned, immutable scoring resource.
///
/// All state is read-only after construction, so a handle can be shared
/// across threads (`Arc<ServiceHandle>`) without locking. [`Self::reload`]
/// is the single mutation point: it builds the replacement bundle fully
/// before swapping, and requires `&mut self`, so no reader can observe a
/// half-updated handle.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    bundle: ArtifactBundle,
    records: HashMap<u64, ClientRecord>,
    policy: RiskPolicy,
}

impl ServiceHandle {
    /// Loads a bundle from disk and indexes the snapshot by client id.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleLoadError`]; the missing-bundle case means the
    /// model has not been trained yet and should be reported as such.
    pub fn load(
        bundle_path: &Path,
        records: Vec<ClientRecord>,
        policy: RiskPolicy,
    ) -> Result<Self, BundleLoadError> {
        let bundle = ArtifactBundle::load(bundle_path)?;
        info!(
            path = %bundle_path.display(),
            trees = bundle.model.n_trees(),
            clients = records.len(),
            "Loaded scoring bundle"
        );
        Ok(Self::from_parts(bundle, records, policy))
    }

    /// Builds a handle from already-loaded parts.
    ///
    /// Useful for tests and for callers that manage bundle bytes
    /// themselves.
    #[must_use]
    pub fn from_parts(
        bundle: ArtifactBundle,
        records: Vec<ClientRecord>,
        policy: RiskPolicy,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.client_id, record))
            .collect();
        Self {
            bundle,
            records,
            policy,
        }
    }

    /// Swaps in a newly trained bundle.
    ///
    /// The replacement is loaded and validated completely before the swap;
    /// on failure the current bundle stays in place.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleLoadError`] if the new bundle cannot be loaded.
    pub fn reload(&mut self, bundle_path: &Path) -> Result<(), BundleLoadError> {
        let bundle = ArtifactBundle::load(bundle_path)?;
        info!(path = %bundle_path.display(), "Reloaded scoring bundle");
        self.bundle = bundle;
        Ok(())
    }

    /// Scores one client from the current snapshot.
    ///
    /// Pure with respect to the handle: repeated queries with no
    /// intervening reload return identical reports.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::ClientNotFound`] for an unknown id, or a
    /// codec error if the stored record cannot be transformed under the
    /// fitted codec.
    pub fn score(&self, client_id: u64) -> Result<RiskReport, ScoreError> {
        let record = self
            .records
            .get(&client_id)
            .ok_or(ScoreError::ClientNotFound(client_id))?;

        let features = self.bundle.codec.transform(record)?;
        let probability = self.bundle.model.predict_proba(&features);

        debug!(client_id, probability, "Scored client");

        Ok(RiskReport {
            client_id,
            probability_of_default: probability,
            decision: Decision::from_probability(probability, self.policy.decision_threshold),
            risk_tier: RiskTier::from_probability(probability, &self.policy.tiers),
            rationale: rationale_for(record),
        })
    }

    /// Returns the raw record for a client, if present.
    #[must_use]
    pub fn client(&self, client_id: u64) -> Option<&ClientRecord> {
        self.records.get(&client_id)
    }

    /// The currently loaded bundle.
    #[must_use]
    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }
}

#[cfg(test)]
mod tests {
    use config::TrainConfig;

    use super::*;

    fn record(
        id: u64,
        sector: &str,
        income: f64,
        ratio: f64,
        tenure: u32,
        mm: u8,
        label: Option<u8>,
    ) -> ClientRecord {
        ClientRecord {
            client_id: id,
            business_sector: sector.to_string(),
            monthly_income_fcfa: income,
            debt_to_income: ratio,
            tenure_months: tenure,
            mobile_money_score: mm,
            loan_status: label,
        }
    }

    /// Separable training corpus including a known-good client 7.
    fn corpus() -> Vec<ClientRecord> {
        let mut records = vec![record(7, "Commerce", 520_000.0, 0.25, 60, 82, Some(0))];
        for i in 0..20u64 {
            records.push(record(
                i + 10,
                "Commerce",
                450_000.0 + i as f64 * 10_000.0,
                0.15 + i as f64 * 0.005,
                48 + i as u32,
                75 + (i % 20) as u8,
                Some(0),
            ));
            records.push(record(
                i + 100,
                "Agriculture",
                100_000.0 + i as f64 * 1_000.0,
                0.70 + i as f64 * 0.005,
                2 + i as u32 / 4,
                10 + (i % 15) as u8,
                Some(1),
            ));
        }
        records
    }

    fn handle() -> ServiceHandle {
        let records = corpus();
        let config = TrainConfig {
            n_trees: 25,
            ..TrainConfig::default()
        };
        let output = pipeline::train(&records, &config).expect("train");
        ServiceHandle::from_parts(output.bundle, records, RiskPolicy::default())
    }

    #[test]
    fn test_healthy_client_scores_low_tier() {
        let handle = handle();
        let report = handle.score(7).expect("score");
        assert!(report.probability_of_default < 0.30);
        assert_eq!(report.risk_tier, RiskTier::Low);
        assert_eq!(report.decision, Decision::Approve);
        assert_eq!(report.rationale.len(), 3);
    }

    #[test]
    fn test_risky_client_scores_high_tier() {
        let handle = handle();
        let report = handle.score(100).expect("score");
        assert!(report.probability_of_default >= 0.60);
        assert_eq!(report.risk_tier, RiskTier::High);
        assert_eq!(report.decision, Decision::Reject);
    }

    #[test]
    fn test_score_is_pure() {
        let handle = handle();
        let a = handle.score(7).expect("score");
        let b = handle.score(7).expect("score");
        assert_eq!(a.probability_of_default, b.probability_of_default);
        assert_eq!(a.risk_tier, b.risk_tier);
        assert_eq!(a.rationale, b.rationale);
    }

    #[test]
    fn test_unknown_client_is_reported() {
        let handle = handle();
        let err = handle.score(999_999).expect_err("not found");
        assert!(matches!(err, ScoreError::ClientNotFound(999_999)));
    }

    #[test]
    fn test_unseen_sector_is_an_unknown_category() {
        let records = corpus();
        let config = TrainConfig {
            n_trees: 25,
            ..TrainConfig::default()
        };
        let output = pipeline::train(&records, &config).expect("train");

        // Serving snapshot carries a sector the codec never saw at fit time.
        let mut serving = records;
        serving.push(record(
            500,
            "Nouveau_Secteur_Jamais_Vu",
            250_000.0,
            0.30,
            24,
            60,
            None,
        ));
        let handle = ServiceHandle::from_parts(output.bundle, serving, RiskPolicy::default());

        let err = handle.score(500).expect_err("unknown category");
        assert!(matches!(
            err,
            ScoreError::Codec(CodecError::UnknownCategory { .. })
        ));
        // The failed query leaves the handle usable.
        assert!(handle.score(7).is_ok());
    }

    #[test]
    fn test_persisted_bundle_reproduces_in_memory_predictions() {
        let records = corpus();
        let config = TrainConfig {
            n_trees: 25,
            ..TrainConfig::default()
        };
        let output = pipeline::train(&records, &config).expect("train");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bundle.json");
        output.bundle.save(&path).expect("save");

        let in_memory =
            ServiceHandle::from_parts(output.bundle, records.clone(), RiskPolicy::default());
        let reloaded =
            ServiceHandle::load(&path, records, RiskPolicy::default()).expect("load");

        for id in [7, 10, 100, 115] {
            let a = in_memory.score(id).expect("score");
            let b = reloaded.score(id).expect("score");
            assert_eq!(a.probability_of_default, b.probability_of_default);
        }
    }

    #[test]
    fn test_reload_failure_keeps_old_bundle() {
        let mut handle = handle();
        let before = handle.score(7).expect("score");

        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.json");
        let err = handle.reload(&missing).expect_err("missing bundle");
        assert!(matches!(err, BundleLoadError::NotFound { .. }));

        let after = handle.score(7).expect("score");
        assert_eq!(before.probability_of_default, after.probability_of_default);
    }

    #[test]
    fn test_reload_swaps_in_new_bundle() {
        let records = corpus();
        let base = TrainConfig {
            n_trees: 25,
            ..TrainConfig::default()
        };
        let retrain = TrainConfig { seed: 7, ..base.clone() };

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bundle.json");

        pipeline::train(&records, &base)
            .expect("train")
            .bundle
            .save(&path)
            .expect("save");
        let mut handle =
            ServiceHandle::load(&path, records.clone(), RiskPolicy::default()).expect("load");
        assert_eq!(handle.bundle().metadata.seed, 42);

        pipeline::train(&records, &retrain)
            .expect("retrain")
            .bundle
            .save(&path)
            .expect("save");
        handle.reload(&path).expect("reload");
        assert_eq!(handle.bundle().metadata.seed, 7);
    }
}
