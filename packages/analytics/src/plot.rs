//! Fine payment behaviour by how often a plate is ticketed.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use scofftow_analytics_models::{FineBinRow, PlateFineTotals, ViolationBin};
use scofftow_fines_models::{Money, PlateKey, ViolationRecord};

use crate::{count_f64, mean, money_ratio, ratio};

#[derive(Default)]
struct PlateSums {
    total_fines: Money,
    total_amount_due: Money,
    total_payment_amount: Money,
    total_violations: u64,
    total_penalties: Money,
    total_interest: Money,
}

/// Per-plate fine totals, most-ticketed plates first. Ties are ordered by
/// plate key.
#[must_use]
pub fn plate_fine_totals(records: &[ViolationRecord]) -> Vec<PlateFineTotals> {
    let mut sums: BTreeMap<&PlateKey, PlateSums> = BTreeMap::new();
    for record in records {
        let s = sums.entry(&record.key).or_default();
        s.total_fines += record.total_fine;
        s.total_amount_due += record.amount_due;
        s.total_payment_amount += record.payment_amount;
        s.total_violations += 1;
        s.total_penalties += record.penalty_amount;
        s.total_interest += record.interest_amount;
    }

    let mut totals: Vec<PlateFineTotals> = sums
        .into_iter()
        .map(|(key, s)| PlateFineTotals {
            plate: key.plate.clone(),
            state: key.state.clone(),
            license_type: key.license_type.clone(),
            share_of_fines_paid: money_ratio(s.total_payment_amount, s.total_fines),
            total_fines: s.total_fines,
            total_amount_due: s.total_amount_due,
            total_payment_amount: s.total_payment_amount,
            total_violations: s.total_violations,
            total_penalties: s.total_penalties,
            total_interest: s.total_interest,
        })
        .collect();
    totals.sort_by_key(|t| Reverse(t.total_violations));
    totals
}

fn per_plate(amount: Money, plates: u64) -> Option<f64> {
    ratio(amount.as_f64(), count_f64(plates))
}

fn percent(share: Option<f64>) -> Option<f64> {
    share.map(|s| s * 100.0)
}

/// Bins per-plate totals by violation count. Only bins holding at least
/// one plate are listed.
#[must_use]
pub fn fine_bin_table(plates: &[PlateFineTotals]) -> Vec<FineBinRow> {
    let mut bins: BTreeMap<ViolationBin, Vec<&PlateFineTotals>> = BTreeMap::new();
    for plate in plates {
        if let Some(bin) = ViolationBin::for_violations(plate.total_violations) {
            bins.entry(bin).or_default().push(plate);
        }
    }

    bins.into_iter()
        .map(|(violations_bin, members)| {
            let fines_paid: Money = members.iter().map(|p| p.total_payment_amount).sum();
            let total_fines: Money = members.iter().map(|p| p.total_fines).sum();
            let total_penalties: Money = members.iter().map(|p| p.total_penalties).sum();
            let total_interest: Money = members.iter().map(|p| p.total_interest).sum();
            let total_violations: u64 = members.iter().map(|p| p.total_violations).sum();
            let n_plates = members.len() as u64;
            let outstanding_fines = total_fines - fines_paid;

            FineBinRow {
                violations_bin,
                fines_paid,
                total_fines,
                total_violations,
                n_plates,
                total_penalties,
                total_interest,
                share_of_fines_paid_driver_avg: percent(mean(
                    members.iter().filter_map(|p| p.share_of_fines_paid),
                )),
                share_of_fines_paid: percent(money_ratio(fines_paid, total_fines)),
                average_fines: per_plate(total_fines, n_plates),
                average_penalties: per_plate(total_penalties, n_plates),
                average_interest: per_plate(total_interest, n_plates),
                outstanding_fines,
                average_outstanding_fine: per_plate(outstanding_fines, n_plates),
                penalty_share: percent(money_ratio(total_penalties, total_fines)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(plate: &str, summons: &str, fine: i64, penalty: i64, paid: i64) -> ViolationRecord {
        let total_fine = Money::from_dollars(fine + penalty);
        ViolationRecord {
            key: PlateKey::new(plate, "NY", "PAS"),
            summons_number: summons.to_owned(),
            issue_date: None,
            fine_amount: Money::from_dollars(fine),
            penalty_amount: Money::from_dollars(penalty),
            interest_amount: Money::ZERO,
            reduction_amount: Money::ZERO,
            amount_due: total_fine - Money::from_dollars(paid),
            payment_amount: Money::from_dollars(paid),
            total_fine,
            in_judgement: false,
        }
    }

    #[test]
    fn totals_per_plate_sorted_by_violations() {
        let records = vec![
            record("A", "1", 50, 0, 50),
            record("B", "2", 50, 25, 0),
            record("B", "3", 50, 25, 0),
        ];
        let totals = plate_fine_totals(&records);

        assert_eq!(totals[0].plate, "B");
        assert_eq!(totals[0].total_violations, 2);
        assert_eq!(totals[0].total_fines, Money::from_dollars(150));
        assert_eq!(totals[0].total_penalties, Money::from_dollars(50));
        assert_eq!(totals[0].share_of_fines_paid, Some(0.0));
        assert_eq!(totals[1].share_of_fines_paid, Some(1.0));
    }

    #[test]
    fn bins_payment_shares() {
        let records = vec![
            record("A", "1", 50, 0, 50),
            record("B", "2", 100, 50, 0),
        ];
        let table = fine_bin_table(&plate_fine_totals(&records));

        assert_eq!(table.len(), 1);
        let bin = &table[0];
        assert_eq!(bin.violations_bin.label(), "1-5");
        assert_eq!(bin.n_plates, 2);
        assert_eq!(bin.total_violations, 2);
        assert_eq!(bin.fines_paid, Money::from_dollars(50));
        assert_eq!(bin.total_fines, Money::from_dollars(200));
        assert_eq!(bin.share_of_fines_paid, Some(25.0));
        assert_eq!(bin.share_of_fines_paid_driver_avg, Some(50.0));
        assert_eq!(bin.average_fines, Some(100.0));
        assert_eq!(bin.outstanding_fines, Money::from_dollars(150));
        assert_eq!(bin.average_outstanding_fine, Some(75.0));
        assert_eq!(bin.penalty_share, Some(25.0));
    }

    #[test]
    fn zero_fine_plate_has_no_paid_share() {
        let totals = plate_fine_totals(&[record("A", "1", 0, 0, 0)]);
        assert_eq!(totals[0].share_of_fines_paid, None);
    }
}
