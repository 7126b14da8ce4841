//! Score command - prints the risk report for one client.

use std::path::Path;

use anyhow::{Context, Result};
use artifact::BundleLoadError;
use config::RiskPolicy;
use risk_types::Decision;
use scoring::{ScoreError, ServiceHandle};
use tracing::warn;

/// Runs the score command.
///
/// The two expected operational states, a missing bundle (model not yet
/// trained) and an unknown client id, are reported as messages rather
/// than propagated as failures.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the bundle is
/// corrupt or version-incompatible.
pub fn run(dataset_path: &Path, bundle_path: &Path, client_id: u64) -> Result<()> {
    let policy = RiskPolicy::from_env()?;

    let records = dataset::load_snapshot(dataset_path)
        .with_context(|| format!("load snapshot {}", dataset_path.display()))?;

    let handle = match ServiceHandle::load(bundle_path, records, policy) {
        Ok(handle) => handle,
        Err(BundleLoadError::NotFound { path }) => {
            warn!(path, "No artifact bundle found");
            println!("Model not yet trained: no bundle at {path}. Run the train command first.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let report = match handle.score(client_id) {
        Ok(report) => report,
        Err(ScoreError::ClientNotFound(id)) => {
            println!("Client {id} not found in the current snapshot.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    // The record exists whenever scoring succeeded.
    let record = handle
        .client(client_id)
        .context("scored client missing from snapshot")?;

    println!("=== Risk report: client {client_id} ===");
    println!("Sector:             {}", record.business_sector);
    println!("Monthly income:     {:.0} FCFA", record.monthly_income_fcfa);
    println!("Debt-to-income:     {:.1}%", record.debt_to_income * 100.0);
    println!("Tenure:             {} months", record.tenure_months);
    println!("Mobile money score: {}/100", record.mobile_money_score);
    println!();
    println!(
        "Probability of default: {:.2}%",
        report.probability_of_default * 100.0
    );
    println!("Risk tier:              {}", report.risk_tier.label());
    let decision = match report.decision {
        Decision::Approve => "loan approved",
        Decision::Reject => "loan not recommended",
    };
    println!("Suggested decision:     {decision}");
    println!();
    println!("Commentary (template interpretation of raw attributes):");
    for line in &report.rationale {
        println!("  - {line}");
    }

    Ok(())
}
