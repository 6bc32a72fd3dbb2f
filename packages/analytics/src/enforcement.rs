//! Gap between tow eligibility and actual enforcement.

use chrono::NaiveDate;
use scofftow_analytics_models::{
    EnforcementAction, EnforcementReport, JudgementThresholdView, PlateEnforcement,
};
use scofftow_fines_models::{Money, PlateAggregateRow};
use scofftow_tow::CaseIndex;
use scofftow_tow_models::TowCase;

use crate::{count_f64, mean, money_ratio, ratio};

/// Classifies the enforcement of a plate that became tow-eligible on
/// `tow_eligible_date`. An action on the eligibility date itself counts as
/// post-eligibility.
#[must_use]
pub fn classify(tow_eligible_date: NaiveDate, case: Option<&TowCase>) -> EnforcementAction {
    let Some(case) = case else {
        return EnforcementAction::NoCase;
    };
    match case.first_action_date() {
        None => EnforcementAction::NoActionDate,
        Some(action_date) if action_date < tow_eligible_date => {
            EnforcementAction::ActionBeforeEligibility { action_date }
        }
        Some(action_date) => EnforcementAction::ActionAfterEligibility { action_date },
    }
}

/// Per-plate enforcement outcome for every plate with an eligibility date,
/// in input order.
#[must_use]
pub fn plate_enforcement(rows: &[PlateAggregateRow], cases: &CaseIndex) -> Vec<PlateEnforcement> {
    rows.iter()
        .filter_map(|row| {
            let tow_eligible_date = row.tow_eligible_date?;
            let key = row.key();
            let case = cases.get(&key);
            Some(PlateEnforcement {
                tow_eligible_date,
                case_number: case.map(|c| c.case_number.clone()),
                action: classify(tow_eligible_date, case),
                violations: row.violations,
                violations_post_tow_eligible: row.violations_post_tow_eligible,
                amount_due_post_tow_eligible: row.amount_due_post_tow_eligible,
                key,
            })
        })
        .collect()
}

/// Plates whose in-judgement balance exceeds `tow_threshold`, checked for
/// any case at all.
#[must_use]
pub fn judgement_threshold_view(
    rows: &[PlateAggregateRow],
    cases: &CaseIndex,
    tow_threshold: Money,
) -> JudgementThresholdView {
    let over: Vec<&PlateAggregateRow> = rows
        .iter()
        .filter(|row| row.fines_in_judgement > tow_threshold)
        .collect();
    let never_towed: Vec<&PlateAggregateRow> = over
        .iter()
        .copied()
        .filter(|row| cases.get(&row.key()).is_none())
        .collect();

    let plates_over_threshold = over.len() as u64;
    let plates_never_towed = never_towed.len() as u64;
    let plates_with_case = plates_over_threshold - plates_never_towed;

    JudgementThresholdView {
        plates_over_threshold,
        plates_with_case,
        share_with_case: ratio(count_f64(plates_with_case), count_f64(plates_over_threshold)),
        plates_never_towed,
        mean_fines_in_judgement_never_towed: mean(
            never_towed.iter().map(|row| row.fines_in_judgement.as_f64()),
        ),
    }
}

/// Builds the enforcement-gap report.
///
/// A plate counts as not towed when it has no case, its case has no
/// action date, or its first action predates the eligibility date.
#[must_use]
pub fn enforcement_gap(
    rows: &[PlateAggregateRow],
    cases: &CaseIndex,
    tow_threshold: Money,
) -> EnforcementReport {
    let plates = plate_enforcement(rows, cases);

    let mut plates_not_towed = 0_u64;
    let mut violations_post = 0_u64;
    let mut violations_post_not_towed = 0_u64;
    let mut due_post = Money::ZERO;
    let mut due_post_not_towed = Money::ZERO;
    let mut violations_eligible = 0_u64;

    for plate in &plates {
        violations_eligible += plate.violations;
        violations_post += plate.violations_post_tow_eligible;
        due_post += plate.amount_due_post_tow_eligible;
        if !plate.action.is_towed_post_eligibility() {
            plates_not_towed += 1;
            violations_post_not_towed += plate.violations_post_tow_eligible;
            due_post_not_towed += plate.amount_due_post_tow_eligible;
        }
    }

    let violations_all: u64 = rows.iter().map(|row| row.violations).sum();
    let violations_post_all: u64 = rows.iter().map(|row| row.violations_post_tow_eligible).sum();
    let eligible_plates = plates.len() as u64;

    log::debug!(
        "{plates_not_towed} of {eligible_plates} tow-eligible plate(s) not towed after eligibility"
    );

    EnforcementReport {
        eligible_plates,
        plates_not_towed,
        share_not_towed: ratio(count_f64(plates_not_towed), count_f64(eligible_plates)),
        violations_post_tow_eligible: violations_post,
        violations_post_tow_eligible_not_towed: violations_post_not_towed,
        share_violations_not_towed: ratio(
            count_f64(violations_post_not_towed),
            count_f64(violations_post),
        ),
        amount_due_post_tow_eligible: due_post,
        amount_due_post_tow_eligible_not_towed: due_post_not_towed,
        share_amount_due_not_towed: money_ratio(due_post_not_towed, due_post),
        share_violations_post_tow_eligible: ratio(
            count_f64(violations_post_all),
            count_f64(violations_all),
        ),
        share_violations_post_tow_eligible_among_eligible: ratio(
            count_f64(violations_post),
            count_f64(violations_eligible),
        ),
        judgement: judgement_threshold_view(rows, cases, tow_threshold),
    }
}
