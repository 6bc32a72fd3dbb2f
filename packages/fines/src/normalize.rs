//! Record normalizer.
//!
//! Converts raw violation rows into typed [`ViolationRecord`]s, deriving
//! `total_fine` and `in_judgement`, and drops exact duplicates of the raw
//! rows.
//!
//! Unparseable issue dates are coerced to `None` rather than failing the
//! run; such records can never be in judgement. Missing columns and
//! malformed amounts are fatal.

use std::collections::HashSet;

use chrono::NaiveDate;
use scofftow_fines_models::{Money, PipelineConfig, PlateKey, RawRecord, ViolationRecord};

use crate::FinesError;
use crate::parsing::{parse_amount, parse_date};

/// Columns read into a [`ViolationRecord`]. Every other column is carried
/// only for duplicate detection.
const RECORD_COLUMNS: [&str; 11] = [
    "plate",
    "state",
    "license_type",
    "summons_number",
    "issue_date",
    "fine_amount",
    "penalty_amount",
    "interest_amount",
    "reduction_amount",
    "amount_due",
    "payment_amount",
];

/// Identity of a raw row for duplicate detection: the typed record (so
/// `"10"` and `"10.00"` match and unparseable dates compare equal) plus the
/// raw value of every column the record does not model.
type DedupKey<'a> = (&'a ViolationRecord, Vec<(&'a str, &'a str)>);

fn dedup_key<'a>(row: &'a RawRecord, record: &'a ViolationRecord) -> DedupKey<'a> {
    let extra = row
        .iter()
        .filter(|(column, _)| !RECORD_COLUMNS.contains(&column.as_str()))
        .map(|(column, value)| (column.as_str(), value.as_str()))
        .collect();
    (record, extra)
}

/// `fine + penalty + interest - reduction`. May be negative.
#[must_use]
pub fn total_fine(fine: Money, penalty: Money, interest: Money, reduction: Money) -> Money {
    fine + penalty + interest - reduction
}

/// Whether a fine is in judgement as of `config.as_of`: issued strictly
/// more than `judgement_age_days` ago and still carrying a positive
/// balance. Always `false` without an issue date.
#[must_use]
pub fn is_in_judgement(
    issue_date: Option<NaiveDate>,
    amount_due: Money,
    config: &PipelineConfig,
) -> bool {
    let Some(issue_date) = issue_date else {
        return false;
    };
    (config.as_of - issue_date).num_days() > config.judgement_age_days && amount_due.is_positive()
}

fn field<'a>(row: &'a RawRecord, column: &str, row_number: usize) -> Result<&'a str, FinesError> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| FinesError::MissingColumn {
            column: column.to_owned(),
            row: row_number,
        })
}

fn amount(row: &RawRecord, column: &str, row_number: usize) -> Result<Money, FinesError> {
    let value = field(row, column, row_number)?;
    parse_amount(value).map_err(|_| FinesError::InvalidAmount {
        column: column.to_owned(),
        row: row_number,
        value: value.to_owned(),
    })
}

/// Normalizes a single raw row. `row_number` is 1-based and only used in
/// error messages.
///
/// # Errors
///
/// Returns [`FinesError::MissingColumn`] if a required column is absent, or
/// [`FinesError::InvalidAmount`] if a currency cell cannot be parsed.
pub fn normalize_violation(
    row: &RawRecord,
    row_number: usize,
    config: &PipelineConfig,
) -> Result<ViolationRecord, FinesError> {
    let key = PlateKey::new(
        field(row, "plate", row_number)?,
        field(row, "state", row_number)?,
        field(row, "license_type", row_number)?,
    );
    let summons_number = field(row, "summons_number", row_number)?.to_owned();
    let issue_date = parse_date(field(row, "issue_date", row_number)?);

    let fine_amount = amount(row, "fine_amount", row_number)?;
    let penalty_amount = amount(row, "penalty_amount", row_number)?;
    let interest_amount = amount(row, "interest_amount", row_number)?;
    let reduction_amount = amount(row, "reduction_amount", row_number)?;
    let amount_due = amount(row, "amount_due", row_number)?;
    let payment_amount = amount(row, "payment_amount", row_number)?;

    Ok(ViolationRecord {
        key,
        summons_number,
        issue_date,
        fine_amount,
        penalty_amount,
        interest_amount,
        reduction_amount,
        amount_due,
        payment_amount,
        total_fine: total_fine(fine_amount, penalty_amount, interest_amount, reduction_amount),
        in_judgement: is_in_judgement(issue_date, amount_due, config),
    })
}

/// Normalizes a batch of raw rows and removes exact duplicates, keeping the
/// first occurrence in input order. Rows are duplicates only when every
/// column matches, including columns not carried into the record.
///
/// # Errors
///
/// Returns the first [`FinesError`] raised by [`normalize_violation`].
pub fn normalize_violations(
    rows: &[RawRecord],
    config: &PipelineConfig,
) -> Result<Vec<ViolationRecord>, FinesError> {
    let normalized = rows
        .iter()
        .enumerate()
        .map(|(i, row)| normalize_violation(row, i + 1, config))
        .collect::<Result<Vec<_>, _>>()?;

    let coerced = rows
        .iter()
        .zip(&normalized)
        .filter(|(row, record)| {
            record.issue_date.is_none() && row.get("issue_date").is_some_and(|v| !v.is_empty())
        })
        .count();
    if coerced > 0 {
        log::warn!("{coerced} issue date(s) could not be parsed and were left empty");
    }

    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(normalized.len());
        rows.iter()
            .zip(&normalized)
            .map(|(row, record)| seen.insert(dedup_key(row, record)))
            .collect()
    };

    let total = normalized.len();
    let records: Vec<ViolationRecord> = normalized
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect();

    log::debug!(
        "Normalized {total} rows, dropped {} duplicate(s)",
        total - records.len()
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 4, 22).unwrap())
    }

    fn row(summons: &str, issue_date: &str, amount_due: &str) -> RawRecord {
        [
            ("plate", "LER5337"),
            ("state", "NY"),
            ("license_type", "PAS"),
            ("summons_number", summons),
            ("issue_date", issue_date),
            ("fine_amount", "50"),
            ("penalty_amount", "25"),
            ("interest_amount", "1.25"),
            ("reduction_amount", "0"),
            ("amount_due", amount_due),
            ("payment_amount", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    #[test]
    fn total_fine_subtracts_reduction() {
        let total = total_fine(
            Money::from_dollars(50),
            Money::from_dollars(10),
            Money::from_cents(125),
            Money::from_dollars(100),
        );
        assert_eq!(total, Money::from_cents(-3_875));
    }

    #[test]
    fn judgement_requires_age_strictly_over_threshold() {
        let config = config();
        let due = Money::from_dollars(50);
        let exactly_75 = config.as_of - chrono::Days::new(75);
        let day_76 = config.as_of - chrono::Days::new(76);
        assert!(!is_in_judgement(Some(exactly_75), due, &config));
        assert!(is_in_judgement(Some(day_76), due, &config));
    }

    #[test]
    fn judgement_requires_positive_balance() {
        let config = config();
        let old = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(!is_in_judgement(Some(old), Money::ZERO, &config));
        assert!(!is_in_judgement(Some(old), Money::from_cents(-100), &config));
    }

    #[test]
    fn missing_issue_date_is_never_in_judgement() {
        assert!(!is_in_judgement(None, Money::from_dollars(500), &config()));
    }

    #[test]
    fn normalizes_row() {
        let record = normalize_violation(&row("1", "01/02/2024", "76.25"), 1, &config()).unwrap();
        assert_eq!(record.key, PlateKey::new("LER5337", "NY", "PAS"));
        assert_eq!(record.total_fine, Money::from_cents(7_625));
        assert!(record.in_judgement);
    }

    #[test]
    fn unparseable_date_is_coerced() {
        let record = normalize_violation(&row("1", "garbage", "76.25"), 1, &config()).unwrap();
        assert_eq!(record.issue_date, None);
        assert!(!record.in_judgement);
    }

    #[test]
    fn missing_column_is_fatal() {
        let mut raw = row("1", "01/02/2024", "10");
        raw.remove("amount_due");
        let err = normalize_violation(&raw, 7, &config()).unwrap_err();
        assert!(matches!(
            err,
            FinesError::MissingColumn { ref column, row: 7 } if column == "amount_due"
        ));
    }

    #[test]
    fn invalid_amount_is_fatal() {
        let err = normalize_violation(&row("1", "01/02/2024", "ten"), 3, &config()).unwrap_err();
        assert!(matches!(err, FinesError::InvalidAmount { row: 3, .. }));
    }

    #[test]
    fn drops_exact_duplicates() {
        let rows = vec![
            row("1", "01/02/2024", "10"),
            row("1", "01/02/2024", "10"),
            row("2", "01/02/2024", "10"),
        ];
        let records = normalize_violations(&rows, &config()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summons_number, "1");
        assert_eq!(records[1].summons_number, "2");
    }

    #[test]
    fn missing_dates_compare_equal_for_dedup() {
        let rows = vec![row("1", "", "10"), row("1", "", "10")];
        assert_eq!(normalize_violations(&rows, &config()).unwrap().len(), 1);
    }

    #[test]
    fn rows_differing_only_in_unmodeled_column_are_kept() {
        let mut morning = row("1", "01/02/2024", "10");
        morning.insert("violation_time".to_owned(), "08:01A".to_owned());
        let mut later = morning.clone();
        later.insert("violation_time".to_owned(), "09:15A".to_owned());

        let rows = vec![morning.clone(), later, morning];
        assert_eq!(normalize_violations(&rows, &config()).unwrap().len(), 2);
    }

    #[test]
    fn equal_amounts_in_different_notation_are_duplicates() {
        let rows = vec![row("1", "01/02/2024", "10"), row("1", "01/02/2024", "$10.00")];
        assert_eq!(normalize_violations(&rows, &config()).unwrap().len(), 1);
    }

    #[test]
    fn unparseable_dates_compare_equal_for_dedup() {
        let rows = vec![row("1", "garbage", "10"), row("1", "", "10")];
        assert_eq!(normalize_violations(&rows, &config()).unwrap().len(), 1);
    }

    #[test]
    fn rows_differing_in_one_field_are_kept() {
        let rows = vec![row("1", "01/02/2024", "10"), row("1", "01/02/2024", "11")];
        assert_eq!(normalize_violations(&rows, &config()).unwrap().len(), 2);
    }
}
