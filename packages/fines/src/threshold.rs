//! Tow-eligibility threshold crossing.
//!
//! A plate becomes tow-eligible on the issue date of the in-judgement
//! violation whose balance pushes the plate's running in-judgement total
//! strictly above the tow threshold. Violations are ordered by issue date
//! within each plate; violations sharing an issue date keep their input
//! order.

use std::collections::HashMap;

use chrono::NaiveDate;
use scofftow_fines_models::{Money, PlateKey, ThresholdCrossing, ViolationRecord};

/// Finds the first threshold crossing for every plate that has one.
///
/// Plates with no in-judgement violations, or whose in-judgement balance
/// never exceeds `threshold`, are absent from the result. The result is
/// ordered by plate key.
#[must_use]
pub fn threshold_crossings(
    records: &[ViolationRecord],
    threshold: Money,
) -> Vec<ThresholdCrossing> {
    let mut in_judgement: Vec<(&ViolationRecord, NaiveDate)> = records
        .iter()
        .filter(|r| r.in_judgement)
        .filter_map(|r| r.issue_date.map(|date| (r, date)))
        .collect();

    // `sort_by` is stable, which fixes the tie-break on equal issue dates.
    in_judgement.sort_by(|(a, a_date), (b, b_date)| a.key.cmp(&b.key).then(a_date.cmp(b_date)));

    let mut crossings = Vec::new();

    for plate in in_judgement.chunk_by(|(a, _), (b, _)| a.key == b.key) {
        let mut cumulative_due = Money::ZERO;
        for (record, issue_date) in plate {
            cumulative_due += record.amount_due;
            if cumulative_due > threshold {
                crossings.push(ThresholdCrossing {
                    key: record.key.clone(),
                    tow_eligible_date: *issue_date,
                    cumulative_due,
                });
                break;
            }
        }
    }

    log::info!(
        "{} plate(s) crossed the {threshold} tow threshold",
        crossings.len()
    );

    crossings
}

/// Indexes crossings by plate key for joining back onto violations.
#[must_use]
pub fn eligibility_index(crossings: &[ThresholdCrossing]) -> HashMap<&PlateKey, NaiveDate> {
    crossings
        .iter()
        .map(|c| (&c.key, c.tow_eligible_date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn violation(plate: &str, summons: &str, issued: NaiveDate, due: i64) -> ViolationRecord {
        ViolationRecord {
            key: PlateKey::new(plate, "NY", "PAS"),
            summons_number: summons.to_owned(),
            issue_date: Some(issued),
            fine_amount: Money::from_dollars(due),
            penalty_amount: Money::ZERO,
            interest_amount: Money::ZERO,
            reduction_amount: Money::ZERO,
            amount_due: Money::from_dollars(due),
            payment_amount: Money::ZERO,
            total_fine: Money::from_dollars(due),
            in_judgement: true,
        }
    }

    #[test]
    fn crossing_row_is_the_one_that_exceeds() {
        let records = vec![
            violation("A", "1", date(2024, 1, 1), 100),
            violation("A", "2", date(2024, 1, 2), 150),
            violation("A", "3", date(2024, 1, 3), 150),
        ];
        let crossings = threshold_crossings(&records, Money::from_dollars(350));
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].tow_eligible_date, date(2024, 1, 3));
        assert_eq!(crossings[0].cumulative_due, Money::from_dollars(400));
    }

    #[test]
    fn reaching_threshold_exactly_is_not_a_crossing() {
        let records = vec![
            violation("A", "1", date(2024, 1, 1), 200),
            violation("A", "2", date(2024, 1, 2), 150),
        ];
        assert!(threshold_crossings(&records, Money::from_dollars(350)).is_empty());
    }

    #[test]
    fn ignores_violations_not_in_judgement() {
        let mut late = violation("A", "2", date(2024, 1, 2), 300);
        late.in_judgement = false;
        let records = vec![violation("A", "1", date(2024, 1, 1), 100), late];
        assert!(threshold_crossings(&records, Money::from_dollars(350)).is_empty());
    }

    #[test]
    fn sorts_by_issue_date_before_summing() {
        let records = vec![
            violation("A", "3", date(2024, 3, 1), 300),
            violation("A", "1", date(2024, 1, 1), 100),
            violation("A", "2", date(2024, 2, 1), 100),
        ];
        let crossings = threshold_crossings(&records, Money::from_dollars(350));
        assert_eq!(crossings[0].tow_eligible_date, date(2024, 3, 1));
        assert_eq!(crossings[0].cumulative_due, Money::from_dollars(500));
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            violation("A", "1", date(2024, 1, 1), 300),
            violation("A", "2", date(2024, 1, 5), 40),
            violation("A", "3", date(2024, 1, 5), 60),
        ];
        let crossings = threshold_crossings(&records, Money::from_dollars(350));
        assert_eq!(crossings[0].tow_eligible_date, date(2024, 1, 5));
        assert_eq!(crossings[0].cumulative_due, Money::from_dollars(400));
    }

    #[test]
    fn plates_are_independent() {
        let records = vec![
            violation("A", "1", date(2024, 1, 1), 200),
            violation("B", "2", date(2024, 1, 2), 400),
            violation("A", "3", date(2024, 1, 3), 200),
            violation("C", "4", date(2024, 1, 3), 10),
        ];
        let crossings = threshold_crossings(&records, Money::from_dollars(350));
        let keys: Vec<&str> = crossings.iter().map(|c| c.key.plate.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(crossings[0].tow_eligible_date, date(2024, 1, 3));
        assert_eq!(crossings[1].tow_eligible_date, date(2024, 1, 2));
    }

    #[test]
    fn index_looks_up_by_key() {
        let records = vec![violation("A", "1", date(2024, 1, 1), 400)];
        let crossings = threshold_crossings(&records, Money::from_dollars(350));
        let index = eligibility_index(&crossings);
        assert_eq!(
            index.get(&PlateKey::new("A", "NY", "PAS")),
            Some(&date(2024, 1, 1))
        );
    }
}
