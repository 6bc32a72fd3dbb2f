#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scofflaw tow case normalization and plate lookup.
//!
//! Raw rows come from the DOF "Scofftow Case Information" export with
//! column names already lowercased and underscored (e.g. `tow_(y/n)`).

pub mod index;

use scofftow_fines::parsing::parse_date;
use scofftow_fines_models::{PlateKey, RawRecord};
use scofftow_tow_models::TowCase;
use thiserror::Error;

pub use index::CaseIndex;

/// Errors that can occur while normalizing tow cases.
#[derive(Debug, Error)]
pub enum TowError {
    /// A required column is absent from an input row.
    #[error("Missing required column '{column}' in row {row}")]
    MissingColumn {
        /// Column name (accepted aliases are listed with `|`).
        column: String,
        /// 1-based data row number.
        row: usize,
    },
}

/// Column aliases: the raw export name first, then the processed name.
const PLATE_COLUMNS: &[&str] = &["license_plate_number", "plate_id"];
const TOWED_COLUMNS: &[&str] = &["tow_(y/n)", "towed"];
const REDEEMED_COLUMNS: &[&str] = &["redeemed_(y/n)", "redeemed"];
const AUCTIONED_COLUMNS: &[&str] = &["auctioned_(y/n)", "auctioned"];

fn field<'a>(row: &'a RawRecord, aliases: &[&str], row_number: usize) -> Result<&'a str, TowError> {
    aliases
        .iter()
        .find_map(|name| row.get(*name))
        .map(String::as_str)
        .ok_or_else(|| TowError::MissingColumn {
            column: aliases.join("|"),
            row: row_number,
        })
}

/// Maps a `Y`/`N` flag (also `true`/`false`) to a bool. Anything else is
/// missing.
#[must_use]
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_uppercase().as_str() {
        "Y" | "TRUE" => Some(true),
        "N" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Normalizes a single raw case row. `row_number` is 1-based.
///
/// # Errors
///
/// Returns [`TowError::MissingColumn`] if a required column is absent.
pub fn normalize_tow_case(row: &RawRecord, row_number: usize) -> Result<TowCase, TowError> {
    Ok(TowCase {
        case_number: field(row, &["case_number"], row_number)?.to_owned(),
        key: PlateKey::new(
            field(row, PLATE_COLUMNS, row_number)?,
            field(row, &["license_plate_issuing_state"], row_number)?,
            field(row, &["license_plate_type"], row_number)?,
        ),
        boot_date: parse_date(field(row, &["boot_date"], row_number)?),
        tow_date: parse_date(field(row, &["tow_date"], row_number)?),
        auction_date: parse_date(field(row, &["auction_date"], row_number)?),
        towed: parse_flag(field(row, TOWED_COLUMNS, row_number)?),
        redeemed: parse_flag(field(row, REDEEMED_COLUMNS, row_number)?),
        auctioned: parse_flag(field(row, AUCTIONED_COLUMNS, row_number)?),
    })
}

/// Normalizes every raw case row, preserving input order.
///
/// # Errors
///
/// Returns the first [`TowError`] raised by [`normalize_tow_case`].
pub fn normalize_tow_cases(rows: &[RawRecord]) -> Result<Vec<TowCase>, TowError> {
    let cases = rows
        .iter()
        .enumerate()
        .map(|(i, row)| normalize_tow_case(row, i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let undated = cases
        .iter()
        .filter(|c| c.first_action_date().is_none())
        .count();
    log::info!("Normalized {} tow case(s)", cases.len());
    if undated > 0 {
        log::warn!("{undated} case(s) have neither a boot nor a tow date");
    }

    Ok(cases)
}
