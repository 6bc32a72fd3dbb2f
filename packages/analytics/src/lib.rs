#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reports over the plate aggregate table and the tow case table.
//!
//! Every report is a pure function of its inputs. Plate aggregates are
//! consumed in their zero-filled [`PlateAggregateRow`] form, the same shape
//! that is written to and read back from CSV.
//!
//! [`PlateAggregateRow`]: scofftow_fines_models::PlateAggregateRow

pub mod bins;
pub mod enforcement;
pub mod history;
pub mod plot;
pub mod runaways;
pub mod scroll;
pub mod summary;

use scofftow_fines_models::Money;

/// Window of the trailing rolling means in the date series.
pub const ROLLING_WINDOW: usize = 7;

/// `numerator / denominator`, or `None` when the denominator is zero.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) const fn count_f64(count: u64) -> f64 {
    count as f64
}

pub(crate) fn money_ratio(numerator: Money, denominator: Money) -> Option<f64> {
    ratio(numerator.as_f64(), denominator.as_f64())
}

/// Mean of `f64` values, `None` for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0_u64), |(sum, n), v| (sum + v, n + 1));
    ratio(sum, count_f64(n))
}

/// Trailing mean over `window` rows, missing until a full window exists.
pub(crate) fn rolling_mean(values: &[u64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| {
                let slice = &values[i + 1 - window..=i];
                slice.iter().copied().map(count_f64).sum::<f64>() / count_f64(window as u64)
            })
        })
        .collect()
}
