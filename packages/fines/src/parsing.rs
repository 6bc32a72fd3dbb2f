//! Cell-level parsing for violation rows.

use chrono::{NaiveDate, NaiveDateTime};
use scofftow_fines_models::{Money, ParseMoneyError};

/// Parses a date in any of the formats the open-data exports use:
/// `MM/DD/YYYY`, `YYYY-MM-DD`, or a Socrata ISO datetime with optional
/// fractional seconds (the time part is dropped).
///
/// Returns `None` for blank or unrecognized values.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.date());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.date());
    }
    None
}

/// Parses a currency cell. Blank cells are zero.
///
/// # Errors
///
/// Returns [`ParseMoneyError`] if the cell is non-blank and not an amount.
pub fn parse_amount(s: &str) -> Result<Money, ParseMoneyError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Money::ZERO);
    }
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_us_date() {
        assert_eq!(parse_date("03/15/2024"), Some(date(2024, 3, 15)));
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_date("2024-03-15"), Some(date(2024, 3, 15)));
    }

    #[test]
    fn parses_socrata_datetime() {
        assert_eq!(
            parse_date("2024-03-15T00:00:00.000"),
            Some(date(2024, 3, 15))
        );
        assert_eq!(
            parse_date("2024-03-15T08:30:00"),
            Some(date(2024, 3, 15))
        );
    }

    #[test]
    fn coerces_garbage_to_none() {
        assert_eq!(parse_date("13/45/2024"), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn blank_amount_is_zero() {
        assert_eq!(parse_amount("").unwrap(), Money::ZERO);
    }

    #[test]
    fn invalid_amount_is_error() {
        assert!(parse_amount("twelve").is_err());
    }
}
