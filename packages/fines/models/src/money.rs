//! Exact currency amounts.
//!
//! Fine records carry dollar amounts with at most two decimal places. They
//! are held as [`Decimal`]s so sums and differences are exact, which keeps
//! `total_fine` and cumulative threshold checks free of floating-point
//! drift.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A signed dollar amount with at most cent precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

/// Error returned when a string cannot be parsed as a [`Money`] amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid currency amount {value:?}")]
pub struct ParseMoneyError {
    /// The input that failed to parse.
    pub value: String,
}

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from whole cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        let magnitude = cents.unsigned_abs();
        Self(Decimal::from_parts(
            magnitude as u32,
            (magnitude >> 32) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// Creates an amount from whole dollars.
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        let magnitude = dollars.unsigned_abs();
        Self(Decimal::from_parts(
            magnitude as u32,
            (magnitude >> 32) as u32,
            0,
            dollars < 0,
            0,
        ))
    }

    /// The underlying decimal value in dollars.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns the amount in dollars as a float, for ratios and means.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    fn try_from_decimal(amount: Decimal) -> Option<Self> {
        (amount.normalize().scale() <= 2).then_some(Self(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses amounts such as `"115"`, `"115.5"`, `"-10.25"`, or
    /// `"$1,234.00"`. Fractional digits beyond cents must be zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| *c != '$' && *c != ',')
            .collect();

        Decimal::from_str_exact(&cleaned)
            .ok()
            .and_then(Self::try_from_decimal)
            .ok_or_else(|| ParseMoneyError {
                value: s.to_owned(),
            })
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|money| money.0).sum())
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Written with exactly two decimals so processed tables read like the raw
/// extracts.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts anything `rust_decimal` deserializes (strings and numbers), then
/// rejects sub-cent precision.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_from_decimal(amount).ok_or_else(|| {
            serde::de::Error::custom(format!("currency amount {amount} has sub-cent precision"))
        })
    }
}
