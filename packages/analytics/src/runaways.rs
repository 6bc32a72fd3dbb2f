//! Plates becoming tow-eligible over time.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use scofftow_analytics_models::{DailyCount, RunawayPoint};
use scofftow_fines_models::PlateAggregateRow;

use crate::{ROLLING_WINDOW, rolling_mean};

/// Counts dates in ascending order.
pub(crate) fn count_by_date(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<(NaiveDate, u64)> {
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in dates {
        *counts.entry(date).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Per-date plate counts with a trailing rolling mean over dates that have
/// at least one plate.
#[must_use]
pub fn daily_counts(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<DailyCount> {
    let counts = count_by_date(dates);
    let values: Vec<u64> = counts.iter().map(|(_, n)| *n).collect();
    counts
        .into_iter()
        .zip(rolling_mean(&values, ROLLING_WINDOW))
        .map(|((date, plates), plates_7day)| DailyCount {
            date,
            plates,
            plates_7day,
        })
        .collect()
}

/// Number of plates becoming tow-eligible per date, with the running
/// total and a trailing seven-row mean.
#[must_use]
pub fn runaway_series(rows: &[PlateAggregateRow]) -> Vec<RunawayPoint> {
    let mut cumulative = 0;
    daily_counts(rows.iter().filter_map(|row| row.tow_eligible_date))
        .into_iter()
        .map(|day| {
            cumulative += day.plates;
            RunawayPoint {
                tow_eligible_date: day.date,
                runaways: day.plates,
                cumulative_runaways: cumulative,
                runaways_7day: day.plates_7day,
            }
        })
        .collect()
}
