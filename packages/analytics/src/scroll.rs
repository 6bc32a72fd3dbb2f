//! Recent eligibility versus recent enforcement.

use std::collections::HashSet;

use chrono::NaiveDate;
use scofftow_analytics_models::{MajorityPostEligible, ScrollReport};
use scofftow_fines_models::{PlateAggregateRow, PlateKey};
use scofftow_tow_models::TowCase;

use crate::{count_f64, mean, ratio, runaways::daily_counts};

/// Plates that became tow-eligible on or after `since`, in input order.
#[must_use]
pub fn plates_eligible_since(
    rows: &[PlateAggregateRow],
    since: NaiveDate,
) -> Vec<&PlateAggregateRow> {
    rows.iter()
        .filter(|row| row.tow_eligible_date.is_some_and(|date| date >= since))
        .collect()
}

/// Stats for plates whose post-eligibility violations exceed half of
/// their violations.
#[must_use]
pub fn majority_post_eligible(eligible: &[&PlateAggregateRow]) -> MajorityPostEligible {
    let majority: Vec<&PlateAggregateRow> = eligible
        .iter()
        .copied()
        .filter(|row| row.violations_post_tow_eligible * 2 > row.violations)
        .collect();
    let plates = majority.len() as u64;
    let eligible_plates = eligible.len() as u64;

    MajorityPostEligible {
        plates,
        eligible_plates,
        share: ratio(count_f64(plates), count_f64(eligible_plates)),
        mean_violations: mean(majority.iter().map(|row| count_f64(row.violations))),
        mean_violations_post_tow_eligible: mean(
            majority
                .iter()
                .map(|row| count_f64(row.violations_post_tow_eligible)),
        ),
    }
}

/// Builds the eligibility and first-action series since `since`.
///
/// The action series counts every case (not just the first per plate)
/// whose plate has an aggregate row, by first-action date on or after
/// `since`. Cases for unknown plates or without an action date drop out.
#[must_use]
pub fn scroll_report(
    rows: &[PlateAggregateRow],
    cases: &[TowCase],
    since: NaiveDate,
) -> ScrollReport {
    let eligible = plates_eligible_since(rows, since);

    let plates: HashSet<PlateKey> = rows.iter().map(PlateAggregateRow::key).collect();
    let action_dates = cases
        .iter()
        .filter(|case| plates.contains(&case.key))
        .filter_map(TowCase::first_action_date)
        .filter(|date| *date >= since);

    ScrollReport {
        since,
        eligible: daily_counts(eligible.iter().filter_map(|row| row.tow_eligible_date)),
        actioned: daily_counts(action_dates),
        majority_post_eligible: majority_post_eligible(&eligible),
    }
}
