use std::str::FromStr;

use anyhow::Context;
use risk_types::TierThresholds;
use serde::{Deserialize, Serialize};

/// Scoring policy applied on top of the model's probability output.
///
/// Tier thresholds and the decision cutoff are lending policy, not model
/// parameters, so they live here rather than in the artifact bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Risk tier boundaries.
    pub tiers: TierThresholds,

    /// Probability of default at or above which a loan is rejected.
    pub decision_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            tiers: TierThresholds::default(),
            decision_threshold: 0.5,
        }
    }
}

impl RiskPolicy {
    /// Loads the scoring policy from environment variables.
    ///
    /// Optional environment variables (defaults in parentheses):
    /// - `RISK_TIER_LOW_MAX`: upper bound of the low tier (0.30)
    /// - `RISK_TIER_HIGH_MIN`: lower bound of the high tier (0.60)
    /// - `RISK_DECISION_THRESHOLD`: rejection cutoff (0.5)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but unparseable, or if the
    /// thresholds are not ordered within [0, 1].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let policy = Self {
            tiers: TierThresholds {
                low_max: env_or("RISK_TIER_LOW_MAX", defaults.tiers.low_max)?,
                high_min: env_or("RISK_TIER_HIGH_MIN", defaults.tiers.high_min)?,
            },
            decision_threshold: env_or("RISK_DECISION_THRESHOLD", defaults.decision_threshold)?,
        };
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let ordered = 0.0 < self.tiers.low_max
            && self.tiers.low_max <= self.tiers.high_min
            && self.tiers.high_min <= 1.0;
        anyhow::ensure!(
            ordered,
            "risk tier thresholds must satisfy 0 < low_max <= high_min <= 1 \
             (got low_max={}, high_min={})",
            self.tiers.low_max,
            self.tiers.high_min
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.decision_threshold),
            "decision threshold must lie in [0, 1] (got {})",
            self.decision_threshold
        );
        Ok(())
    }
}

/// Training pipeline knobs.
///
/// Defaults: 80/20 split with seed 42 and
/// a 200-tree forest. Reproducibility of a retrain depends on pinning the
/// seed, so it is part of the configuration rather than ambient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Fraction of the snapshot held out for evaluation.
    pub test_fraction: f64,

    /// Seed for the split shuffle and the per-tree bootstrap sampling.
    pub seed: u64,

    /// Number of trees in the forest.
    pub n_trees: usize,

    /// Optional depth cap for individual trees; `None` grows to purity.
    pub max_depth: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            n_trees: 200,
            max_depth: None,
        }
    }
}

impl TrainConfig {
    /// Loads training configuration from environment variables.
    ///
    /// Optional environment variables (defaults in parentheses):
    /// - `TRAIN_TEST_FRACTION`: held-out fraction (0.2)
    /// - `TRAIN_SEED`: split and bootstrap seed (42)
    /// - `TRAIN_TREES`: forest size (200)
    /// - `TRAIN_MAX_DEPTH`: tree depth cap (unset = grow to purity)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but unparseable, or if the
    /// values are out of range.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            test_fraction: env_or("TRAIN_TEST_FRACTION", defaults.test_fraction)?,
            seed: env_or("TRAIN_SEED", defaults.seed)?,
            n_trees: env_or("TRAIN_TREES", defaults.n_trees)?,
            max_depth: env_opt("TRAIN_MAX_DEPTH")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.test_fraction > 0.0 && self.test_fraction < 1.0,
            "test fraction must lie in (0, 1) (got {})",
            self.test_fraction
        );
        anyhow::ensure!(self.n_trees > 0, "forest must have at least one tree");
        Ok(())
    }
}

/// Reads an environment variable, falling back to a default when unset.
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Reads an optional environment variable, `None` when unset.
fn env_opt<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let train = TrainConfig::default();
        assert_eq!(train.seed, 42);
        assert_eq!(train.n_trees, 200);
        assert!((train.test_fraction - 0.2).abs() < f64::EPSILON);

        let policy = RiskPolicy::default();
        assert!((policy.tiers.low_max - 0.30).abs() < f64::EPSILON);
        assert!((policy.tiers.high_min - 0.60).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_unordered_tiers() {
        let policy = RiskPolicy {
            tiers: TierThresholds {
                low_max: 0.7,
                high_min: 0.3,
            },
            decision_threshold: 0.5,
        };
        assert!(policy.validate().is_err());
    }
}
