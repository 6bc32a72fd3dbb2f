#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the enforcement and fine reports.
//!
//! Report structs serialize as `camelCase` JSON; table rows serialize as
//! `snake_case` CSV columns. Ratios whose denominator is zero are `None`.

use chrono::NaiveDate;
use scofftow_fines_models::{Money, PlateKey};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of five-violation bins before the open-ended `100+` bin.
const BOUNDED_BINS: u8 = 20;

/// How the city acted on a tow-eligible plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementAction {
    /// No tow or boot case exists for the plate.
    NoCase,
    /// A case exists but carries neither a boot nor a tow date.
    NoActionDate,
    /// The first boot/tow predates the tow-eligible date.
    ActionBeforeEligibility { action_date: NaiveDate },
    /// The first boot/tow is on or after the tow-eligible date.
    ActionAfterEligibility { action_date: NaiveDate },
}

impl EnforcementAction {
    /// Whether the plate was booted or towed once it was eligible.
    #[must_use]
    pub const fn is_towed_post_eligibility(self) -> bool {
        matches!(self, Self::ActionAfterEligibility { .. })
    }

    #[must_use]
    pub const fn action_date(self) -> Option<NaiveDate> {
        match self {
            Self::NoCase | Self::NoActionDate => None,
            Self::ActionBeforeEligibility { action_date }
            | Self::ActionAfterEligibility { action_date } => Some(action_date),
        }
    }
}

/// Enforcement outcome for one tow-eligible plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateEnforcement {
    pub key: PlateKey,
    pub tow_eligible_date: NaiveDate,
    pub case_number: Option<String>,
    pub action: EnforcementAction,
    pub violations: u64,
    pub violations_post_tow_eligible: u64,
    pub amount_due_post_tow_eligible: Money,
}

/// Plates whose in-judgement balance exceeds the tow threshold, joined
/// against any tow case regardless of timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgementThresholdView {
    /// Plates with `fines_in_judgement` above the threshold.
    pub plates_over_threshold: u64,
    /// Of those, plates with any tow/boot case.
    pub plates_with_case: u64,
    /// `plates_with_case / plates_over_threshold`.
    pub share_with_case: Option<f64>,
    /// Plates over the threshold with no case at all.
    pub plates_never_towed: u64,
    /// Mean `fines_in_judgement` (dollars) among never-towed plates.
    pub mean_fines_in_judgement_never_towed: Option<f64>,
}

/// Gap between tow eligibility and actual enforcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementReport {
    /// Plates with a tow-eligible date.
    pub eligible_plates: u64,
    /// Eligible plates never booted or towed after becoming eligible.
    pub plates_not_towed: u64,
    /// `plates_not_towed / eligible_plates`.
    pub share_not_towed: Option<f64>,
    /// Post-eligibility violations across eligible plates.
    pub violations_post_tow_eligible: u64,
    /// Post-eligibility violations on plates not towed.
    pub violations_post_tow_eligible_not_towed: u64,
    /// Fraction of post-eligibility violations on plates not towed.
    pub share_violations_not_towed: Option<f64>,
    /// Post-eligibility amount due across eligible plates.
    pub amount_due_post_tow_eligible: Money,
    /// Post-eligibility amount due on plates not towed.
    pub amount_due_post_tow_eligible_not_towed: Money,
    /// Fraction of post-eligibility dollars on plates not towed.
    pub share_amount_due_not_towed: Option<f64>,
    /// Share of all violations (every plate) issued after eligibility.
    pub share_violations_post_tow_eligible: Option<f64>,
    /// Same share restricted to eligible plates.
    pub share_violations_post_tow_eligible_among_eligible: Option<f64>,
    /// Judgement-threshold view of the same data.
    pub judgement: JudgementThresholdView,
}

/// A plate-count bin by number of violations: `1-5`, `6-10`, ...,
/// `96-100`, `100+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViolationBin(u8);

impl ViolationBin {
    /// Bins a violation count. Zero violations fall in no bin.
    #[must_use]
    pub fn for_violations(violations: u64) -> Option<Self> {
        match violations {
            0 => None,
            1..=100 => u8::try_from((violations - 1) / 5).ok().map(Self),
            _ => Some(Self(BOUNDED_BINS)),
        }
    }

    /// All bins in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=BOUNDED_BINS).map(Self)
    }

    /// Human-readable label, e.g. `"6-10"` or `"100+"`.
    #[must_use]
    pub fn label(self) -> String {
        if self.0 >= BOUNDED_BINS {
            "100+".to_owned()
        } else {
            let lower = u32::from(self.0) * 5 + 1;
            format!("{lower}-{}", lower + 4)
        }
    }
}

impl std::fmt::Display for ViolationBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for ViolationBin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tow-eligible plates grouped by violation count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationBinRow {
    pub violations_bin: ViolationBin,
    /// Distinct plates in the bin.
    pub n: u64,
    /// Plates whose case has the tow flag set.
    pub tow: u64,
    pub violations: u64,
    pub violations_post_tow_eligible: u64,
    pub amount_due: Money,
    pub amount_due_post_tow_eligible: Money,
    pub tow_share: Option<f64>,
    pub violations_post_tow_eligible_share: Option<f64>,
    pub amount_due_post_tow_eligible_share: Option<f64>,
}

/// Number of plates that became tow-eligible on a date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunawayPoint {
    pub tow_eligible_date: NaiveDate,
    pub runaways: u64,
    pub cumulative_runaways: u64,
    /// Mean of `runaways` over this and the previous six rows.
    pub runaways_7day: Option<f64>,
}

/// Count of plates per date with a trailing seven-row mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub plates: u64,
    pub plates_7day: Option<f64>,
}

/// Plates doing most of their violating after becoming tow-eligible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorityPostEligible {
    /// Plates whose post-eligibility violations exceed half their total.
    pub plates: u64,
    /// Plates eligible since the cut-off.
    pub eligible_plates: u64,
    pub share: Option<f64>,
    pub mean_violations: Option<f64>,
    pub mean_violations_post_tow_eligible: Option<f64>,
}

/// Eligibility versus enforcement since a cut-off date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollReport {
    pub since: NaiveDate,
    /// Plates per tow-eligible date.
    pub eligible: Vec<DailyCount>,
    /// Plates per first boot/tow date.
    pub actioned: Vec<DailyCount>,
    pub majority_post_eligible: MajorityPostEligible,
}

/// Fine totals for one plate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateFineTotals {
    pub plate: String,
    pub state: String,
    pub license_type: String,
    pub total_fines: Money,
    pub total_amount_due: Money,
    pub total_payment_amount: Money,
    /// Violation rows, not distinct summons.
    pub total_violations: u64,
    pub total_penalties: Money,
    pub total_interest: Money,
    /// `total_payment_amount / total_fines`.
    pub share_of_fines_paid: Option<f64>,
}

/// Fine payment behaviour of plates grouped by violation count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FineBinRow {
    pub violations_bin: ViolationBin,
    pub fines_paid: Money,
    pub total_fines: Money,
    pub total_violations: u64,
    pub n_plates: u64,
    pub total_penalties: Money,
    pub total_interest: Money,
    /// Mean of per-plate paid shares, as a percentage.
    pub share_of_fines_paid_driver_avg: Option<f64>,
    /// Paid share of the bin's total fines, as a percentage.
    pub share_of_fines_paid: Option<f64>,
    pub average_fines: Option<f64>,
    pub average_penalties: Option<f64>,
    pub average_interest: Option<f64>,
    pub outstanding_fines: Money,
    pub average_outstanding_fine: Option<f64>,
    /// Penalties as a percentage of total fines.
    pub penalty_share: Option<f64>,
}

/// What kind of event a timeline row represents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Fine,
    Boot,
    Tow,
}

/// One fine, boot, or tow on a plate's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub plate_id: String,
    pub state: String,
    pub license_type: String,
    /// Issue date for fines, boot date for cases.
    pub dt: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub summons_number: Option<String>,
    pub case_number: Option<String>,
    pub total_fine: Option<Money>,
    pub amount_due: Option<Money>,
    pub payment_amount: Option<Money>,
    pub boot_date: Option<NaiveDate>,
    pub tow_date: Option<NaiveDate>,
}

/// Distinct violations and cases for a plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateActivity {
    pub plate_id: String,
    pub state: String,
    pub license_type: String,
    pub violations: u64,
    pub boots_tows: u64,
}

impl PlateActivity {
    #[must_use]
    pub fn key(&self) -> PlateKey {
        PlateKey::new(&self.plate_id, &self.state, &self.license_type)
    }
}

/// Owed and paid totals across every violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineSummary {
    pub violations: u64,
    pub total_fines: Money,
    pub amount_due: Money,
    pub payment_amount: Money,
    /// `amount_due / total_fines` as a percentage.
    pub percent_owed: Option<f64>,
    /// `payment_amount / total_fines` as a percentage.
    pub percent_paid: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_violation_counts() {
        assert_eq!(ViolationBin::for_violations(0), None);
        assert_eq!(ViolationBin::for_violations(1).unwrap().label(), "1-5");
        assert_eq!(ViolationBin::for_violations(5).unwrap().label(), "1-5");
        assert_eq!(ViolationBin::for_violations(6).unwrap().label(), "6-10");
        assert_eq!(ViolationBin::for_violations(100).unwrap().label(), "96-100");
        assert_eq!(ViolationBin::for_violations(101).unwrap().label(), "100+");
    }

    #[test]
    fn lists_all_bins_in_order() {
        let labels: Vec<String> = ViolationBin::all().map(ViolationBin::label).collect();
        assert_eq!(labels.len(), 21);
        assert_eq!(labels.first().unwrap(), "1-5");
        assert_eq!(labels.last().unwrap(), "100+");
    }

    #[test]
    fn only_post_eligibility_action_counts_as_towed() {
        let action_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(
            EnforcementAction::ActionAfterEligibility { action_date }.is_towed_post_eligibility()
        );
        assert!(
            !EnforcementAction::ActionBeforeEligibility { action_date }.is_towed_post_eligibility()
        );
        assert!(!EnforcementAction::NoCase.is_towed_post_eligibility());
        assert!(!EnforcementAction::NoActionDate.is_towed_post_eligibility());
    }

    #[test]
    fn action_displays_variant_name() {
        let action_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let action = EnforcementAction::ActionBeforeEligibility { action_date };
        assert_eq!(action.to_string(), "ACTION_BEFORE_ELIGIBILITY");
        assert_eq!(action.action_date(), Some(action_date));
        assert_eq!(EnforcementAction::NoCase.action_date(), None);
    }

    #[test]
    fn event_kind_serializes_lowercase() {
        assert_eq!(EventKind::Tow.to_string(), "tow");
        assert_eq!(serde_json::to_string(&EventKind::Boot).unwrap(), "\"boot\"");
    }
}
