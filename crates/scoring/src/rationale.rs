//! Template commentary over raw client attributes.
//!
//! These strings interpret the raw record against fixed policy cutoffs.
//! They are presentation templates, not model feature importances, and
//! say nothing about which features actually drove the forest's score.

use risk_types::ClientRecord;

/// Debt-to-income ratio below which the debt load reads as healthy.
const HEALTHY_DEBT_RATIO_MAX: f64 = 0.40;

/// Mobile money score above which digital reliability reads as excellent.
const RELIABLE_MOBILE_SCORE_MIN: u8 = 70;

/// Professional tenure, in months, below which stability is flagged.
const STABLE_TENURE_MIN_MONTHS: u32 = 12;

/// Builds the rationale strings for one client record.
pub(crate) fn rationale_for(record: &ClientRecord) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);

    let ratio_pct = record.debt_to_income * 100.0;
    if record.debt_to_income < HEALTHY_DEBT_RATIO_MAX {
        lines.push(format!(
            "Repayment capacity: a debt-to-income ratio of {ratio_pct:.1}% is a healthy debt load."
        ));
    } else {
        lines.push(format!(
            "Repayment capacity: a debt-to-income ratio of {ratio_pct:.1}% suggests potential over-indebtedness."
        ));
    }

    let reliability = if record.mobile_money_score > RELIABLE_MOBILE_SCORE_MIN {
        "excellent"
    } else {
        "weak"
    };
    lines.push(format!(
        "Mobile money behaviour: a score of {}/100 indicates {reliability} digital financial reliability.",
        record.mobile_money_score
    ));

    if record.tenure_months >= STABLE_TENURE_MIN_MONTHS {
        lines.push(format!(
            "Professional stability: {} months of tenure is a reassurance factor.",
            record.tenure_months
        ));
    } else {
        lines.push(format!(
            "Professional stability: only {} months of tenure, employment history is limited.",
            record.tenure_months
        ));
    }

    lines
}
