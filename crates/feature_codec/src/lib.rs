//! Feature codec for credit risk scoring.
//!
//! This crate transforms raw client records into ML-ready feature vectors
//! used for both training and inference. The training pipeline fits the
//! codec once; the scoring service applies the fitted parameters unchanged,
//! so the two sides can never drift apart on encoding or scaling.

use std::collections::BTreeMap;

use risk_types::{ClientRecord, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fixed-length feature vector in declared schema order.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Errors raised while fitting or applying the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The categorical value was never observed at fit time.
    ///
    /// Surfaced rather than mapped to a default code: a silent fallback
    /// would feed the model a fabricated sector and corrupt the score.
    #[error("unknown category {value:?} for {field}")]
    UnknownCategory {
        field: &'static str,
        value: String,
    },

    /// A record attribute is outside its declared semantic range.
    #[error("schema mismatch on {field}: {reason}")]
    SchemaMismatch {
        field: &'static str,
        reason: String,
    },

    /// The codec cannot be fit without any records.
    #[error("cannot fit codec on an empty corpus")]
    EmptyCorpus,
}

/// Mapping from observed category strings to dense integer codes.
///
/// Codes are assigned in lexicographic order over the distinct values seen
/// at fit time, so refitting on the same corpus reproduces the assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalCodec {
    codes: BTreeMap<String, usize>,
}

impl CategoricalCodec {
    /// Fits the codec on the distinct values of an iterator.
    fn fit<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        // BTreeMap keys iterate sorted, so enumerating the deduplicated
        // set yields lexicographic code assignment.
        let distinct: std::collections::BTreeSet<&str> = values.collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value.to_string(), code))
            .collect();
        Self { codes }
    }

    /// Returns the dense code for a category value, if observed at fit time.
    #[must_use]
    pub fn code(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// Number of distinct categories observed at fit time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if no categories were observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Per-feature affine scaling statistics (mean and standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    means: [f64; FEATURE_COUNT],
    stds: [f64; FEATURE_COUNT],
}

impl ScalerParams {
    /// Fits per-feature mean and population standard deviation.
    ///
    /// Zero-variance features get a unit scale so they pass through as
    /// zero instead of dividing by zero.
    fn fit(matrix: &[FeatureVector]) -> Self {
        let n = matrix.len() as f64;
        let mut means = [0.0; FEATURE_COUNT];
        let mut stds = [0.0; FEATURE_COUNT];

        for row in matrix {
            for (feature, value) in row.iter().enumerate() {
                means[feature] += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        for row in matrix {
            for (feature, value) in row.iter().enumerate() {
                let delta = value - means[feature];
                stds[feature] += delta * delta;
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
            if *std <= f64::EPSILON {
                *std = 1.0;
            }
        }

        Self { means, stds }
    }

    /// Applies the fitted affine transform in place.
    fn apply(&self, features: &mut FeatureVector) {
        for (feature, value) in features.iter_mut().enumerate() {
            *value = (*value - self.means[feature]) / self.stds[feature];
        }
    }
}

/// Fitted codec state: categorical codes plus scaler statistics.
///
/// This is the shared transform contract between training and serving.
/// `fit` runs once over the training corpus; `transform` is pure and uses
/// only the fitted parameters, never refitting on inference inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecState {
    /// Business sector encoding.
    pub sectors: CategoricalCodec,
    /// Per-feature scaling statistics.
    pub scaler: ScalerParams,
}

impl CodecState {
    /// Fits the codec on a training corpus.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyCorpus`] for an empty slice, or a
    /// [`CodecError::SchemaMismatch`] if any record carries out-of-range
    /// attribute values.
    pub fn fit(records: &[ClientRecord]) -> Result<Self, CodecError> {
        if records.is_empty() {
            return Err(CodecError::EmptyCorpus);
        }

        let sectors =
            CategoricalCodec::fit(records.iter().map(|r| r.business_sector.as_str()));

        let mut raw = Vec::with_capacity(records.len());
        for record in records {
            raw.push(raw_features(record, &sectors)?);
        }
        let scaler = ScalerParams::fit(&raw);

        Ok(Self { sectors, scaler })
    }

    /// Transforms one record into a scaled feature vector.
    ///
    /// Pure and side-effect-free; calling it twice on the same record
    /// yields bit-identical output.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownCategory`] for a sector not observed
    /// at fit time, or [`CodecError::SchemaMismatch`] for out-of-range
    /// attribute values.
    pub fn transform(&self, record: &ClientRecord) -> Result<FeatureVector, CodecError> {
        let mut features = raw_features(record, &self.sectors)?;
        self.scaler.apply(&mut features);
        Ok(features)
    }

    /// Transforms a whole corpus, in order.
    ///
    /// Bulk transformation goes through the same per-record path as single
    /// inference queries.
    ///
    /// # Errors
    ///
    /// Fails on the first record that [`Self::transform`] rejects.
    pub fn transform_all(
        &self,
        records: &[ClientRecord],
    ) -> Result<Vec<FeatureVector>, CodecError> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}

/// Assembles the unscaled feature vector in declared schema order.
///
/// Missing columns and mistyped primitives are rejected earlier by typed
/// deserialization; the checks here cover semantic ranges the type system
/// cannot express.
fn raw_features(
    record: &ClientRecord,
    sectors: &CategoricalCodec,
) -> Result<FeatureVector, CodecError> {
    let sector_code = sectors.code(&record.business_sector).ok_or_else(|| {
        CodecError::UnknownCategory {
            field: "Secteur_Activite",
            value: record.business_sector.clone(),
        }
    })?;

    check_non_negative("Ratio_Dette_Revenu", record.debt_to_income)?;
    check_non_negative("Revenu_Mensuel_FCFA", record.monthly_income_fcfa)?;
    if record.mobile_money_score > 100 {
        return Err(CodecError::SchemaMismatch {
            field: "Score_Mobile_Money",
            reason: format!("score {} exceeds the 0-100 bound", record.mobile_money_score),
        });
    }

    Ok([
        sector_code as f64,
        record.monthly_income_fcfa,
        record.debt_to_income,
        f64::from(record.tenure_months),
        f64::from(record.mobile_money_score),
    ])
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), CodecError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CodecError::SchemaMismatch {
            field,
            reason: format!("expected a non-negative finite number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, sector: &str, income: f64, ratio: f64, tenure: u32, mm: u8) -> ClientRecord {
        ClientRecord {
            client_id: id,
            business_sector: sector.to_string(),
            monthly_income_fcfa: income,
            debt_to_income: ratio,
            tenure_months: tenure,
            mobile_money_score: mm,
            loan_status: None,
        }
    }

    fn corpus() -> Vec<ClientRecord> {
        vec![
            record(1, "Commerce", 450_000.0, 0.25, 48, 82),
            record(2, "Agriculture", 120_000.0, 0.80, 6, 20),
            record(3, "Transport", 300_000.0, 0.40, 24, 55),
            record(4, "Commerce", 600_000.0, 0.15, 96, 90),
        ]
    }

    #[test]
    fn test_codes_are_lexicographic() {
        let state = CodecState::fit(&corpus()).expect("fit");
        assert_eq!(state.sectors.code("Agriculture"), Some(0));
        assert_eq!(state.sectors.code("Commerce"), Some(1));
        assert_eq!(state.sectors.code("Transport"), Some(2));
        assert_eq!(state.sectors.len(), 3);
    }

    #[test]
    fn test_refit_is_reproducible() {
        let a = CodecState::fit(&corpus()).expect("fit");
        let b = CodecState::fit(&corpus()).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let state = CodecState::fit(&corpus()).expect("fit");
        let first = state.transform(&corpus()[0]).expect("transform");
        let second = state.transform(&corpus()[0]).expect("transform");
        assert_eq!(first, second);
    }

    #[test]
    fn test_bulk_matches_single() {
        let records = corpus();
        let state = CodecState::fit(&records).expect("fit");
        let bulk = state.transform_all(&records).expect("bulk");
        for (record, row) in records.iter().zip(&bulk) {
            assert_eq!(*row, state.transform(record).expect("single"));
        }
    }

    #[test]
    fn test_scaled_features_are_centered() {
        let records = corpus();
        let state = CodecState::fit(&records).expect("fit");
        let matrix = state.transform_all(&records).expect("bulk");
        for feature in 0..FEATURE_COUNT {
            let mean: f64 =
                matrix.iter().map(|row| row[feature]).sum::<f64>() / matrix.len() as f64;
            assert!(mean.abs() < 1e-9, "feature {feature} mean {mean}");
        }
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let state = CodecState::fit(&corpus()).expect("fit");
        let unseen = record(9, "Nouveau_Secteur_Jamais_Vu", 200_000.0, 0.3, 12, 50);
        let err = state.transform(&unseen).expect_err("unknown category");
        assert!(matches!(err, CodecError::UnknownCategory { .. }));
    }

    #[test]
    fn test_non_finite_income_is_schema_mismatch() {
        let state = CodecState::fit(&corpus()).expect("fit");
        let bad = record(9, "Commerce", f64::NAN, 0.3, 12, 50);
        let err = state.transform(&bad).expect_err("schema mismatch");
        assert!(matches!(
            err,
            CodecError::SchemaMismatch {
                field: "Revenu_Mensuel_FCFA",
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_bound_mobile_score_is_schema_mismatch() {
        let state = CodecState::fit(&corpus()).expect("fit");
        let bad = record(9, "Commerce", 200_000.0, 0.3, 12, 101);
        let err = state.transform(&bad).expect_err("schema mismatch");
        assert!(matches!(
            err,
            CodecError::SchemaMismatch {
                field: "Score_Mobile_Money",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_variance_feature_passes_through() {
        let records = vec![
            record(1, "Commerce", 100.0, 0.5, 12, 50),
            record(2, "Commerce", 200.0, 0.5, 24, 60),
        ];
        let state = CodecState::fit(&records).expect("fit");
        let row = state.transform(&records[0]).expect("transform");
        // Ratio is constant across the corpus: scaled value is 0, not NaN.
        assert_eq!(row[2], 0.0);
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let err = CodecState::fit(&[]).expect_err("empty");
        assert!(matches!(err, CodecError::EmptyCorpus));
    }
}
