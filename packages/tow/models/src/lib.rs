#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scofflaw tow and boot case types.
//!
//! A [`TowCase`] is one enforcement case opened against a plate by the
//! city's scofflaw program. Cases are keyed by the same [`PlateKey`] as
//! fine aggregates so the two datasets can be joined.

use chrono::NaiveDate;
use scofftow_fines_models::PlateKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Final known outcome of a case, derived from its Y/N flags.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseDisposition {
    /// Vehicle was booted but never towed.
    Booted,
    /// Vehicle was towed and not yet redeemed or auctioned.
    Towed,
    /// Vehicle was redeemed by its owner.
    Redeemed,
    /// Vehicle was sold at auction.
    Auctioned,
}

/// A tow or boot case against a plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TowCase {
    pub case_number: String,
    pub key: PlateKey,
    pub boot_date: Option<NaiveDate>,
    pub tow_date: Option<NaiveDate>,
    pub auction_date: Option<NaiveDate>,
    /// `Tow (Y/N)`; `None` when the flag was neither `Y` nor `N`.
    pub towed: Option<bool>,
    /// `Redeemed (Y/N)`.
    pub redeemed: Option<bool>,
    /// `Auctioned (Y/N)`.
    pub auctioned: Option<bool>,
}

impl TowCase {
    /// Earliest of the boot and tow dates, ignoring missing dates.
    #[must_use]
    pub fn first_action_date(&self) -> Option<NaiveDate> {
        match (self.boot_date, self.tow_date) {
            (Some(boot), Some(tow)) => Some(boot.min(tow)),
            (boot, tow) => boot.or(tow),
        }
    }

    /// Whether the vehicle was towed, treating a missing flag as no.
    #[must_use]
    pub fn was_towed(&self) -> bool {
        self.towed == Some(true)
    }

    /// Outcome of the case.
    #[must_use]
    pub fn disposition(&self) -> CaseDisposition {
        if self.auctioned == Some(true) {
            CaseDisposition::Auctioned
        } else if self.redeemed == Some(true) {
            CaseDisposition::Redeemed
        } else if self.was_towed() || self.tow_date.is_some() {
            CaseDisposition::Towed
        } else {
            CaseDisposition::Booted
        }
    }
}

/// Processed CSV shape of a [`TowCase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowCaseRow {
    pub plate_id: String,
    pub license_plate_issuing_state: String,
    pub license_plate_type: String,
    pub case_number: String,
    pub boot_date: Option<NaiveDate>,
    pub tow_date: Option<NaiveDate>,
    pub auction_date: Option<NaiveDate>,
    pub towed: Option<bool>,
    pub redeemed: Option<bool>,
    pub auctioned: Option<bool>,
}

impl From<&TowCase> for TowCaseRow {
    fn from(case: &TowCase) -> Self {
        Self {
            plate_id: case.key.plate.clone(),
            license_plate_issuing_state: case.key.state.clone(),
            license_plate_type: case.key.license_type.clone(),
            case_number: case.case_number.clone(),
            boot_date: case.boot_date,
            tow_date: case.tow_date,
            auction_date: case.auction_date,
            towed: case.towed,
            redeemed: case.redeemed,
            auctioned: case.auctioned,
        }
    }
}

impl From<TowCaseRow> for TowCase {
    fn from(row: TowCaseRow) -> Self {
        Self {
            case_number: row.case_number,
            key: PlateKey::new(
                row.plate_id,
                row.license_plate_issuing_state,
                row.license_plate_type,
            ),
            boot_date: row.boot_date,
            tow_date: row.tow_date,
            auction_date: row.auction_date,
            towed: row.towed,
            redeemed: row.redeemed,
            auctioned: row.auctioned,
        }
    }
}
