#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Violation record and plate aggregate types.
//!
//! Every stage of the fine pipeline speaks in terms of these types: raw
//! rows are normalized into [`ViolationRecord`]s, threshold detection
//! produces [`ThresholdCrossing`]s, and aggregation produces one
//! [`PlateAggregate`] per plate. All groupings and joins are keyed by
//! [`PlateKey`].

mod money;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use money::{Money, ParseMoneyError};

/// A raw input row: normalized column name to trimmed cell value.
pub type RawRecord = BTreeMap<String, String>;

/// Default age (in days) after which an unpaid fine goes into judgement.
pub const DEFAULT_JUDGEMENT_AGE_DAYS: i64 = 75;

/// Default outstanding judgement balance a plate must exceed to become
/// tow-eligible.
pub const DEFAULT_TOW_THRESHOLD: Money = Money::from_dollars(350);

/// Composite identity of a vehicle plate.
///
/// The same plate string registered in a different state or under a
/// different plate type is a distinct vehicle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlateKey {
    /// Plate number as printed (e.g. `"LER5337"`).
    pub plate: String,
    /// Issuing state abbreviation (e.g. `"NY"`).
    pub state: String,
    /// Plate type code (e.g. `"PAS"`, `"COM"`).
    pub license_type: String,
}

impl PlateKey {
    #[must_use]
    pub fn new(
        plate: impl Into<String>,
        state: impl Into<String>,
        license_type: impl Into<String>,
    ) -> Self {
        Self {
            plate: plate.into(),
            state: state.into(),
            license_type: license_type.into(),
        }
    }
}

impl std::fmt::Display for PlateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.plate, self.state, self.license_type)
    }
}

/// A single camera or parking violation after normalization.
///
/// Equality and hashing cover every field, with missing issue dates
/// comparing equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViolationRecord {
    /// Plate the summons was issued to.
    pub key: PlateKey,
    /// Summons identifier.
    pub summons_number: String,
    /// Issue date. `None` when the source value was missing or unparseable.
    pub issue_date: Option<NaiveDate>,
    /// Base fine.
    pub fine_amount: Money,
    /// Late penalty.
    pub penalty_amount: Money,
    /// Accrued interest.
    pub interest_amount: Money,
    /// Reduction granted on hearing or settlement.
    pub reduction_amount: Money,
    /// Outstanding balance.
    pub amount_due: Money,
    /// Amount paid so far.
    pub payment_amount: Money,
    /// `fine + penalty + interest - reduction`.
    pub total_fine: Money,
    /// Whether the fine is older than the judgement age and still unpaid,
    /// as of the pipeline's as-of date.
    pub in_judgement: bool,
}

/// Flat CSV shape of a [`ViolationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRow {
    pub plate: String,
    pub state: String,
    pub license_type: String,
    pub summons_number: String,
    pub issue_date: Option<NaiveDate>,
    pub fine_amount: Money,
    pub penalty_amount: Money,
    pub interest_amount: Money,
    pub reduction_amount: Money,
    pub amount_due: Money,
    pub payment_amount: Money,
    pub total_fine: Money,
    pub in_judgement: bool,
}

impl From<&ViolationRecord> for ViolationRow {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            plate: record.key.plate.clone(),
            state: record.key.state.clone(),
            license_type: record.key.license_type.clone(),
            summons_number: record.summons_number.clone(),
            issue_date: record.issue_date,
            fine_amount: record.fine_amount,
            penalty_amount: record.penalty_amount,
            interest_amount: record.interest_amount,
            reduction_amount: record.reduction_amount,
            amount_due: record.amount_due,
            payment_amount: record.payment_amount,
            total_fine: record.total_fine,
            in_judgement: record.in_judgement,
        }
    }
}

/// The violation at which a plate's cumulative in-judgement balance first
/// exceeded the tow threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCrossing {
    pub key: PlateKey,
    /// Issue date of the crossing violation.
    pub tow_eligible_date: NaiveDate,
    /// Running in-judgement balance through the crossing violation.
    pub cumulative_due: Money,
}

/// Summed fine metrics over a set of violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of `total_fine`.
    pub total_fines: Money,
    /// Sum of `payment_amount`.
    pub amount_paid: Money,
    /// Sum of `amount_due`.
    pub amount_due: Money,
    /// Number of distinct summons numbers.
    pub violations: u64,
}

/// All fine metrics for one plate.
///
/// Sub-aggregates that had no qualifying violations are `None`; they only
/// become zero when flattened into a [`PlateAggregateRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateAggregate {
    pub key: PlateKey,
    /// First date the plate crossed the tow threshold, if ever.
    pub tow_eligible_date: Option<NaiveDate>,
    /// Metrics over every violation.
    pub overall: Totals,
    /// Amount due over in-judgement violations.
    pub fines_in_judgement: Option<Money>,
    /// Metrics over violations issued after the tow-eligible date.
    pub post_tow_eligible: Option<Totals>,
}

/// Flat, zero-filled CSV shape of a [`PlateAggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateAggregateRow {
    pub plate: String,
    pub state: String,
    pub license_type: String,
    pub tow_eligible_date: Option<NaiveDate>,
    pub total_fines: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
    pub violations: u64,
    pub fines_in_judgement: Money,
    pub total_fines_post_tow_eligible: Money,
    pub amount_paid_post_tow_eligible: Money,
    pub amount_due_post_tow_eligible: Money,
    pub violations_post_tow_eligible: u64,
}

impl PlateAggregateRow {
    /// Returns the plate key of this row.
    #[must_use]
    pub fn key(&self) -> PlateKey {
        PlateKey::new(&self.plate, &self.state, &self.license_type)
    }
}

impl From<&PlateAggregate> for PlateAggregateRow {
    fn from(agg: &PlateAggregate) -> Self {
        let post = agg.post_tow_eligible.unwrap_or_default();
        Self {
            plate: agg.key.plate.clone(),
            state: agg.key.state.clone(),
            license_type: agg.key.license_type.clone(),
            tow_eligible_date: agg.tow_eligible_date,
            total_fines: agg.overall.total_fines,
            amount_paid: agg.overall.amount_paid,
            amount_due: agg.overall.amount_due,
            violations: agg.overall.violations,
            fines_in_judgement: agg.fines_in_judgement.unwrap_or_default(),
            total_fines_post_tow_eligible: post.total_fines,
            amount_paid_post_tow_eligible: post.amount_paid,
            amount_due_post_tow_eligible: post.amount_due,
            violations_post_tow_eligible: post.violations,
        }
    }
}

/// Parameters that control judgement and tow-eligibility derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Date the judgement status is evaluated against.
    pub as_of: NaiveDate,
    /// A fine older than this many days (strictly) with a positive balance
    /// is in judgement.
    pub judgement_age_days: i64,
    /// Cumulative in-judgement balance a plate must strictly exceed to
    /// become tow-eligible.
    pub tow_threshold: Money,
}

impl PipelineConfig {
    /// Creates a config with the default judgement age and tow threshold.
    #[must_use]
    pub const fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            judgement_age_days: DEFAULT_JUDGEMENT_AGE_DAYS,
            tow_threshold: DEFAULT_TOW_THRESHOLD,
        }
    }
}
