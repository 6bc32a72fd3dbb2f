//! Plate aggregation.
//!
//! Three reductions over the eligibility-dated violation set, merged on the
//! plate key:
//!
//! | Reduction | Filter | Group |
//! |-----------|--------|-------|
//! | overall | none | plate key + tow-eligible date |
//! | in judgement | `in_judgement` | plate key |
//! | post tow-eligible | `issue_date > tow_eligible_date` | plate key |
//!
//! Sub-aggregates with no qualifying violations stay `None` on the
//! resulting [`PlateAggregate`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use scofftow_fines_models::{
    Money, PlateAggregate, PlateKey, ThresholdCrossing, Totals, ViolationRecord,
};

use crate::threshold::eligibility_index;

/// A violation paired with its plate's tow-eligible date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleViolation<'a> {
    pub record: &'a ViolationRecord,
    pub tow_eligible_date: Option<NaiveDate>,
}

impl EligibleViolation<'_> {
    /// Whether the violation was issued strictly after the plate became
    /// tow-eligible. `false` if either date is missing.
    #[must_use]
    pub fn is_post_tow_eligible(&self) -> bool {
        matches!(
            (self.record.issue_date, self.tow_eligible_date),
            (Some(issued), Some(eligible)) if issued > eligible
        )
    }
}

/// Left-joins each violation with its plate's tow-eligible date.
#[must_use]
pub fn attach_eligibility<'a>(
    records: &'a [ViolationRecord],
    crossings: &[ThresholdCrossing],
) -> Vec<EligibleViolation<'a>> {
    let index = eligibility_index(crossings);
    records
        .iter()
        .map(|record| EligibleViolation {
            record,
            tow_eligible_date: index.get(&record.key).copied(),
        })
        .collect()
}

#[derive(Default)]
struct Accumulator<'a> {
    total_fines: Money,
    amount_paid: Money,
    amount_due: Money,
    summons: HashSet<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, record: &'a ViolationRecord) {
        self.total_fines += record.total_fine;
        self.amount_paid += record.payment_amount;
        self.amount_due += record.amount_due;
        self.summons.insert(&record.summons_number);
    }

    fn finish(self) -> Totals {
        Totals {
            total_fines: self.total_fines,
            amount_paid: self.amount_paid,
            amount_due: self.amount_due,
            violations: self.summons.len() as u64,
        }
    }
}

/// Collapses eligibility-dated violations into one aggregate per
/// `(plate key, tow-eligible date)`, ordered by that pair.
#[must_use]
pub fn aggregate_plates(violations: &[EligibleViolation<'_>]) -> Vec<PlateAggregate> {
    let mut overall: BTreeMap<(&PlateKey, Option<NaiveDate>), Accumulator<'_>> = BTreeMap::new();
    let mut post: HashMap<&PlateKey, Accumulator<'_>> = HashMap::new();
    let mut judgement: HashMap<&PlateKey, Money> = HashMap::new();

    for violation in violations {
        let record = violation.record;

        overall
            .entry((&record.key, violation.tow_eligible_date))
            .or_default()
            .add(record);

        if violation.is_post_tow_eligible() {
            post.entry(&record.key).or_default().add(record);
        }

        if record.in_judgement {
            *judgement.entry(&record.key).or_default() += record.amount_due;
        }
    }

    let post: HashMap<&PlateKey, Totals> = post
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect();

    let aggregates: Vec<PlateAggregate> = overall
        .into_iter()
        .map(|((key, tow_eligible_date), acc)| PlateAggregate {
            key: key.clone(),
            tow_eligible_date,
            overall: acc.finish(),
            fines_in_judgement: judgement.get(key).copied(),
            post_tow_eligible: post.get(key).copied(),
        })
        .collect();

    log::info!(
        "Aggregated {} violation(s) into {} plate row(s)",
        violations.len(),
        aggregates.len()
    );

    aggregates
}

/// Attaches eligibility dates and aggregates in one step.
#[must_use]
pub fn aggregate(
    records: &[ViolationRecord],
    crossings: &[ThresholdCrossing],
) -> Vec<PlateAggregate> {
    aggregate_plates(&attach_eligibility(records, crossings))
}
