//! Client record schema for the banking operations dataset.

use serde::{Deserialize, Serialize};

/// Column name of the client identifier.
pub const CLIENT_ID_COLUMN: &str = "ID_Client";

/// Column name of the binary default label (training snapshots only).
pub const LABEL_COLUMN: &str = "Statut_Pret";

/// Feature columns in declared schema order.
///
/// Both the training matrix and single-record inference assemble features
/// in exactly this order. Reordering this constant is a breaking change to
/// every persisted artifact bundle.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Secteur_Activite",
    "Revenu_Mensuel_FCFA",
    "Ratio_Dette_Revenu",
    "Anciennete_Pro_Mois",
    "Score_Mobile_Money",
];

/// The number of features per client record.
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// One row of the banking operations dataset.
///
/// Serde renames bind the Rust fields to the dataset column names, so a
/// snapshot with missing or mistyped columns fails deserialization instead
/// of silently shifting feature positions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientRecord {
    /// Unique positive client identifier (primary key of the snapshot).
    #[serde(rename = "ID_Client")]
    pub client_id: u64,

    /// Business sector, open string vocabulary.
    #[serde(rename = "Secteur_Activite")]
    pub business_sector: String,

    /// Monthly income in FCFA.
    #[serde(rename = "Revenu_Mensuel_FCFA")]
    pub monthly_income_fcfa: f64,

    /// Debt-to-income ratio as a fraction.
    #[serde(rename = "Ratio_Dette_Revenu")]
    pub debt_to_income: f64,

    /// Months of professional tenure.
    #[serde(rename = "Anciennete_Pro_Mois")]
    pub tenure_months: u32,

    /// Mobile money reliability score, bounded 0-100.
    #[serde(rename = "Score_Mobile_Money")]
    pub mobile_money_score: u8,

    /// Default label: 1 = defaulted, 0 = repaid. Present only in training
    /// snapshots; serving snapshots may omit the column entirely.
    #[serde(rename = "Statut_Pret")]
    pub loan_status: Option<u8>,
}

impl ClientRecord {
    /// Returns true if this record carries a default label.
    #[must_use]
    pub const fn is_labeled(&self) -> bool {
        self.loan_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order_is_stable() {
        assert_eq!(FEATURE_COLUMNS[0], "Secteur_Activite");
        assert_eq!(FEATURE_COLUMNS[FEATURE_COUNT - 1], "Score_Mobile_Money");
        assert_eq!(FEATURE_COUNT, 5);
    }
}
