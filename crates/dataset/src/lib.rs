//! Dataset snapshot loading and schema validation.
//!
//! A snapshot is a CSV file with one row per client. Training snapshots
//! carry the `Statut_Pret` label column; serving snapshots may omit it.
//! Loading enforces the schema up front so downstream code never has to
//! guess at column presence or ordering.

use std::collections::HashSet;
use std::path::Path;

use risk_types::{ClientRecord, CLIENT_ID_COLUMN, FEATURE_COLUMNS};
use thiserror::Error;

/// Errors raised while loading a dataset snapshot.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Required columns are absent from the header row.
    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A row failed to deserialize against the declared schema.
    #[error("dataset row at line {line} is malformed")]
    InvalidRow {
        /// 1-based line number in the file (header is line 1).
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// The client id primary-key invariant is violated.
    #[error("duplicate client id {0} in dataset snapshot")]
    DuplicateClientId(u64),

    /// The file parsed but holds no records.
    #[error("dataset contains no records")]
    Empty,

    /// A training record carries no default label.
    #[error("client {0} has no {label} label", label = risk_types::LABEL_COLUMN)]
    MissingLabel(u64),

    /// A label value is outside the binary domain.
    #[error("client {client_id} has label {value}, expected 0 or 1")]
    InvalidLabel { client_id: u64, value: u8 },

    /// The file could not be opened or read.
    #[error("failed to read dataset")]
    Read(#[from] csv::Error),
}

/// Loads and validates a client snapshot from a CSV file.
///
/// Validation order: header schema first, then per-row deserialization,
/// then the client-id uniqueness invariant.
///
/// # Errors
///
/// Returns a [`DatasetError`] describing the first violation encountered.
pub fn load_snapshot(path: &Path) -> Result<Vec<ClientRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    validate_headers(reader.headers()?)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (index, row) in reader.deserialize::<ClientRecord>().enumerate() {
        // Header occupies line 1, first record is line 2.
        let line = index as u64 + 2;
        let record = row.map_err(|source| DatasetError::InvalidRow { line, source })?;
        if !seen.insert(record.client_id) {
            return Err(DatasetError::DuplicateClientId(record.client_id));
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(records)
}

/// Extracts the binary label vector from a training snapshot.
///
/// Order matches the record slice, so labels line up with the transformed
/// feature matrix row for row.
///
/// # Errors
///
/// Returns [`DatasetError::MissingLabel`] for an unlabeled record and
/// [`DatasetError::InvalidLabel`] for anything outside {0, 1}.
pub fn require_labels(records: &[ClientRecord]) -> Result<Vec<u8>, DatasetError> {
    records
        .iter()
        .map(|record| match record.loan_status {
            Some(value @ (0 | 1)) => Ok(value),
            Some(value) => Err(DatasetError::InvalidLabel {
                client_id: record.client_id,
                value,
            }),
            None => Err(DatasetError::MissingLabel(record.client_id)),
        })
        .collect()
}

/// Checks that every required column is present in the header row.
///
/// `Statut_Pret` is deliberately not required here: serving snapshots do
/// not carry the label.
fn validate_headers(headers: &csv::StringRecord) -> Result<(), DatasetError> {
    let present: HashSet<&str> = headers.iter().collect();

    let missing: Vec<String> = std::iter::once(CLIENT_ID_COLUMN)
        .chain(FEATURE_COLUMNS)
        .filter(|column| !present.contains(column))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::MissingColumns(missing))
    }
}
