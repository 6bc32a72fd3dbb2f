//! Owed and paid shares across every violation.

use scofftow_analytics_models::FineSummary;
use scofftow_fines_models::{Money, ViolationRecord};

use crate::money_ratio;

/// Sums fines, amounts due and payments over `records`.
#[must_use]
pub fn fine_summary(records: &[ViolationRecord]) -> FineSummary {
    let total_fines: Money = records.iter().map(|r| r.total_fine).sum();
    let amount_due: Money = records.iter().map(|r| r.amount_due).sum();
    let payment_amount: Money = records.iter().map(|r| r.payment_amount).sum();

    FineSummary {
        violations: records.len() as u64,
        total_fines,
        amount_due,
        payment_amount,
        percent_owed: money_ratio(amount_due, total_fines).map(|s| s * 100.0),
        percent_paid: money_ratio(payment_amount, total_fines).map(|s| s * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use scofftow_fines_models::PlateKey;

    use super::*;

    fn record(due: i64, paid: i64) -> ViolationRecord {
        ViolationRecord {
            key: PlateKey::new("A", "NY", "PAS"),
            summons_number: format!("{due}-{paid}"),
            issue_date: None,
            fine_amount: Money::from_dollars(due + paid),
            penalty_amount: Money::ZERO,
            interest_amount: Money::ZERO,
            reduction_amount: Money::ZERO,
            amount_due: Money::from_dollars(due),
            payment_amount: Money::from_dollars(paid),
            total_fine: Money::from_dollars(due + paid),
            in_judgement: false,
        }
    }

    #[test]
    fn computes_owed_and_paid_percentages() {
        let summary = fine_summary(&[record(75, 25), record(0, 100)]);
        assert_eq!(summary.violations, 2);
        assert_eq!(summary.total_fines, Money::from_dollars(200));
        assert_eq!(summary.percent_owed, Some(37.5));
        assert_eq!(summary.percent_paid, Some(62.5));
    }

    #[test]
    fn no_fines_has_no_percentages() {
        let summary = fine_summary(&[]);
        assert_eq!(summary.percent_owed, None);
        assert_eq!(summary.percent_paid, None);
    }
}
