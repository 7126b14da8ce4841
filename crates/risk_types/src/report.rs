//! Risk report structures produced by the scoring service.

use serde::{Deserialize, Serialize};

/// Risk tier classification derived from the probability of default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Assigns a tier from a probability of default.
    ///
    /// Boundaries belong to the higher tier: a probability exactly at
    /// `low_max` is Moderate, exactly at `high_min` is High.
    #[must_use]
    pub fn from_probability(probability: f64, thresholds: &TierThresholds) -> Self {
        if probability >= thresholds.high_min {
            Self::High
        } else if probability >= thresholds.low_max {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Human-readable tier label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Configurable tier thresholds.
///
/// These are lending policy, not model output; the defaults mirror the
/// default policy (below 30% low, 30-60% moderate, 60% and above high).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Probabilities strictly below this are Low.
    pub low_max: f64,
    /// Probabilities at or above this are High.
    pub high_min: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low_max: 0.30,
            high_min: 0.60,
        }
    }
}

/// Credit decision suggested by thresholding the probability of default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Approves when the probability of default is strictly below the
    /// decision threshold.
    #[must_use]
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::Reject
        } else {
            Self::Approve
        }
    }
}

/// The scoring service's answer for one client query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    /// The queried client identifier.
    pub client_id: u64,

    /// Probability of default in [0, 1].
    pub probability_of_default: f64,

    /// Suggested credit decision.
    pub decision: Decision,

    /// Risk tier derived from the probability via policy thresholds.
    pub risk_tier: RiskTier,

    /// Template commentary derived from raw feature values.
    ///
    /// These are fixed interpretation templates over the client's raw
    /// attributes, not model feature importances.
    pub rationale: Vec<String>,
}
