//! End-to-end fine pipeline: normalize, detect crossings, aggregate.

use scofftow_fines_models::{
    PipelineConfig, PlateAggregate, PlateAggregateRow, RawRecord, ThresholdCrossing,
    ViolationRecord,
};

use crate::FinesError;
use crate::aggregate::aggregate;
use crate::normalize::normalize_violations;
use crate::threshold::threshold_crossings;

/// Everything the pipeline derives from one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Normalized, per-batch deduplicated violations.
    pub violations: Vec<ViolationRecord>,
    /// First threshold crossing per eligible plate.
    pub crossings: Vec<ThresholdCrossing>,
    /// One aggregate per plate.
    pub aggregates: Vec<PlateAggregate>,
}

impl PipelineOutput {
    /// Flattens the aggregates into zero-filled output rows.
    #[must_use]
    pub fn rows(&self) -> Vec<PlateAggregateRow> {
        self.aggregates.iter().map(PlateAggregateRow::from).collect()
    }
}

/// Runs threshold detection and aggregation over already-normalized
/// violations.
#[must_use]
pub fn derive(violations: Vec<ViolationRecord>, config: &PipelineConfig) -> PipelineOutput {
    let crossings = threshold_crossings(&violations, config.tow_threshold);
    let aggregates = aggregate(&violations, &crossings);
    PipelineOutput {
        violations,
        crossings,
        aggregates,
    }
}

/// Normalizes each batch of raw rows (one batch per input file), then
/// derives crossings and aggregates over the concatenation.
///
/// Duplicates are removed within each batch.
///
/// # Errors
///
/// Returns the first [`FinesError`] raised while normalizing a batch.
pub fn run<'a>(
    batches: impl IntoIterator<Item = &'a [RawRecord]>,
    config: &PipelineConfig,
) -> Result<PipelineOutput, FinesError> {
    let mut violations = Vec::new();
    for (i, batch) in batches.into_iter().enumerate() {
        let normalized = normalize_violations(batch, config)?;
        log::info!(
            "Batch {}: {} row(s) -> {} violation(s)",
            i + 1,
            batch.len(),
            normalized.len()
        );
        violations.extend(normalized);
    }
    log::info!("Processing {} violation(s)", violations.len());

    Ok(derive(violations, config))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use scofftow_fines_models::{Money, PlateKey};

    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::new(NaiveDate::from_ymd_opt(2025, 4, 22).unwrap())
    }

    fn row(plate: &str, summons: &str, issue_date: &str, amount_due: &str) -> RawRecord {
        [
            ("plate", plate),
            ("state", "NY"),
            ("license_type", "PAS"),
            ("summons_number", summons),
            ("issue_date", issue_date),
            ("fine_amount", amount_due),
            ("penalty_amount", "0"),
            ("interest_amount", "0"),
            ("reduction_amount", "0"),
            ("amount_due", amount_due),
            ("payment_amount", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    #[test]
    fn two_judgement_violations_cross_the_threshold() {
        let rows = vec![
            row("LER5337", "1", "01/05/2024", "200"),
            row("LER5337", "2", "02/10/2024", "200"),
            row("LER5337", "3", "04/10/2025", "50"),
        ];

        let output = run([rows.as_slice()], &config()).unwrap();
        let out = output.rows();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key(), PlateKey::new("LER5337", "NY", "PAS"));
        assert_eq!(out[0].fines_in_judgement, Money::from_dollars(400));
        assert_eq!(
            out[0].tow_eligible_date,
            NaiveDate::from_ymd_opt(2024, 2, 10)
        );
        assert_eq!(out[0].violations, 3);
        assert_eq!(out[0].violations_post_tow_eligible, 1);
        assert_eq!(out[0].amount_due_post_tow_eligible, Money::from_dollars(50));
        assert_eq!(output.crossings[0].cumulative_due, Money::from_dollars(400));
    }

    #[test]
    fn ineligible_plate_is_zero_filled() {
        let rows = vec![row("ABC", "1", "01/05/2024", "100")];
        let out = run([rows.as_slice()], &config()).unwrap().rows();
        assert_eq!(out[0].tow_eligible_date, None);
        assert_eq!(out[0].fines_in_judgement, Money::from_dollars(100));
        assert_eq!(out[0].total_fines_post_tow_eligible, Money::ZERO);
        assert_eq!(out[0].violations_post_tow_eligible, 0);
    }

    #[test]
    fn batches_are_concatenated() {
        let first = vec![row("A", "1", "01/05/2023", "200")];
        let second = vec![row("A", "2", "01/05/2024", "200")];
        let output = run([first.as_slice(), second.as_slice()], &config()).unwrap();
        assert_eq!(output.violations.len(), 2);
        assert_eq!(output.crossings.len(), 1);
    }

    #[test]
    fn reruns_are_identical() {
        let rows = vec![
            row("B", "1", "01/05/2024", "300"),
            row("A", "2", "03/05/2024", "400"),
            row("B", "3", "06/05/2024", "100"),
            row("C", "4", "", "100"),
        ];
        let first = run([rows.as_slice()], &config()).unwrap();
        let second = run([rows.as_slice()], &config()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rows(), second.rows());
    }
}
