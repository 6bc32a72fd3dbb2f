//! Plates over the tow threshold binned by violation count.

use std::collections::{BTreeMap, HashSet};

use scofftow_analytics_models::{ViolationBin, ViolationBinRow};
use scofftow_fines_models::{Money, PlateAggregateRow, PlateKey};
use scofftow_tow::CaseIndex;
use scofftow_tow_models::TowCase;

use crate::{count_f64, money_ratio, ratio};

#[derive(Default)]
struct BinTotals {
    plates: HashSet<PlateKey>,
    tow: u64,
    violations: u64,
    violations_post_tow_eligible: u64,
    amount_due: Money,
    amount_due_post_tow_eligible: Money,
}

/// Bins every plate whose `fines_in_judgement` exceeds `tow_threshold`.
///
/// `tow` counts plates whose first case carries a set tow flag. Every bin
/// is listed, empty ones with zero counts and missing shares.
#[must_use]
pub fn violation_bin_table(
    rows: &[PlateAggregateRow],
    cases: &CaseIndex,
    tow_threshold: Money,
) -> Vec<ViolationBinRow> {
    let mut bins: BTreeMap<ViolationBin, BinTotals> =
        ViolationBin::all().map(|bin| (bin, BinTotals::default())).collect();

    for row in rows.iter().filter(|row| row.fines_in_judgement > tow_threshold) {
        let Some(bin) = ViolationBin::for_violations(row.violations) else {
            continue;
        };
        let Some(totals) = bins.get_mut(&bin) else {
            continue;
        };
        let key = row.key();
        if cases.get(&key).is_some_and(TowCase::was_towed) {
            totals.tow += 1;
        }
        totals.plates.insert(key);
        totals.violations += row.violations;
        totals.violations_post_tow_eligible += row.violations_post_tow_eligible;
        totals.amount_due += row.amount_due;
        totals.amount_due_post_tow_eligible += row.amount_due_post_tow_eligible;
    }

    bins.into_iter()
        .map(|(violations_bin, t)| {
            let n = t.plates.len() as u64;
            ViolationBinRow {
                violations_bin,
                n,
                tow: t.tow,
                violations: t.violations,
                violations_post_tow_eligible: t.violations_post_tow_eligible,
                amount_due: t.amount_due,
                amount_due_post_tow_eligible: t.amount_due_post_tow_eligible,
                tow_share: ratio(count_f64(t.tow), count_f64(n)),
                violations_post_tow_eligible_share: ratio(
                    count_f64(t.violations_post_tow_eligible),
                    count_f64(t.violations),
                ),
                amount_due_post_tow_eligible_share: money_ratio(
                    t.amount_due_post_tow_eligible,
                    t.amount_due,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(plate: &str, violations: u64, post: u64, in_judgement: i64) -> PlateAggregateRow {
        PlateAggregateRow {
            plate: plate.to_owned(),
            state: "NY".to_owned(),
            license_type: "PAS".to_owned(),
            tow_eligible_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            total_fines: Money::from_dollars(200),
            amount_paid: Money::ZERO,
            amount_due: Money::from_dollars(200),
            violations,
            fines_in_judgement: Money::from_dollars(in_judgement),
            total_fines_post_tow_eligible: Money::ZERO,
            amount_paid_post_tow_eligible: Money::ZERO,
            amount_due_post_tow_eligible: Money::from_dollars(50),
            violations_post_tow_eligible: post,
        }
    }

    fn towed_case(plate: &str) -> TowCase {
        TowCase {
            case_number: "1".to_owned(),
            key: PlateKey::new(plate, "NY", "PAS"),
            boot_date: None,
            tow_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            auction_date: None,
            towed: Some(true),
            redeemed: None,
            auctioned: None,
        }
    }

    #[test]
    fn bins_plates_over_threshold() {
        let rows = vec![
            row("A", 3, 1, 400),
            row("B", 4, 3, 500),
            row("C", 120, 60, 900),
            row("UNDER", 3, 0, 350),
        ];
        let cases = CaseIndex::first_per_plate(vec![towed_case("A")]);

        let table = violation_bin_table(&rows, &cases, Money::from_dollars(350));

        assert_eq!(table.len(), 21);
        let first = &table[0];
        assert_eq!(first.violations_bin.label(), "1-5");
        assert_eq!(first.n, 2);
        assert_eq!(first.tow, 1);
        assert_eq!(first.violations, 7);
        assert_eq!(first.violations_post_tow_eligible, 4);
        assert_eq!(first.amount_due, Money::from_dollars(400));
        assert_eq!(first.tow_share, Some(0.5));
        assert_eq!(first.amount_due_post_tow_eligible_share, Some(0.25));

        let last = table.last().unwrap();
        assert_eq!(last.violations_bin.label(), "100+");
        assert_eq!(last.n, 1);
        assert_eq!(last.violations_post_tow_eligible_share, Some(0.5));
    }

    #[test]
    fn empty_bins_have_no_shares() {
        let table = violation_bin_table(&[], &CaseIndex::default(), Money::from_dollars(350));
        assert!(table.iter().all(|bin| bin.n == 0 && bin.tow_share.is_none()));
    }
}
