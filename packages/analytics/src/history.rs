//! Combined fine and boot/tow timeline for plates.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;
use scofftow_analytics_models::{EventKind, PlateActivity, TimelineEvent};
use scofftow_fines_models::{PlateKey, ViolationRecord};
use scofftow_tow_models::TowCase;

fn fine_event(record: &ViolationRecord) -> TimelineEvent {
    TimelineEvent {
        plate_id: record.key.plate.clone(),
        state: record.key.state.clone(),
        license_type: record.key.license_type.clone(),
        dt: record.issue_date,
        kind: EventKind::Fine,
        summons_number: Some(record.summons_number.clone()),
        case_number: None,
        total_fine: Some(record.total_fine),
        amount_due: Some(record.amount_due),
        payment_amount: Some(record.payment_amount),
        boot_date: None,
        tow_date: None,
    }
}

fn case_event(case: &TowCase) -> TimelineEvent {
    TimelineEvent {
        plate_id: case.key.plate.clone(),
        state: case.key.state.clone(),
        license_type: case.key.license_type.clone(),
        dt: case.boot_date,
        kind: if case.tow_date.is_some() {
            EventKind::Tow
        } else {
            EventKind::Boot
        },
        summons_number: None,
        case_number: Some(case.case_number.clone()),
        total_fine: None,
        amount_due: None,
        payment_amount: None,
        boot_date: case.boot_date,
        tow_date: case.tow_date,
    }
}

/// Cases whose boot date falls in `year`.
pub fn booted_in(cases: &[TowCase], year: i32) -> impl Iterator<Item = &TowCase> {
    cases
        .iter()
        .filter(move |case| case.boot_date.is_some_and(|d| d.year() == year))
}

/// Merges fines and cases into one timeline sorted by plate key, then
/// event date with undated events last. Fines precede cases on ties.
#[must_use]
pub fn merge_timeline<'a>(
    records: impl IntoIterator<Item = &'a ViolationRecord>,
    cases: impl IntoIterator<Item = &'a TowCase>,
) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = records
        .into_iter()
        .map(fine_event)
        .chain(cases.into_iter().map(case_event))
        .collect();
    events.sort_by(|a, b| {
        (&a.plate_id, &a.state, &a.license_type)
            .cmp(&(&b.plate_id, &b.state, &b.license_type))
            .then_with(|| a.dt.is_none().cmp(&b.dt.is_none()))
            .then_with(|| a.dt.cmp(&b.dt))
    });
    events
}

/// Timeline restricted to one plate number, across states and types.
#[must_use]
pub fn plate_timeline(
    records: &[ViolationRecord],
    cases: &[TowCase],
    plate: &str,
) -> Vec<TimelineEvent> {
    merge_timeline(
        records.iter().filter(|r| r.key.plate == plate),
        cases.iter().filter(|c| c.key.plate == plate),
    )
}

/// Distinct summons and case counts per plate key, for plates with at
/// least one violation. Ordered by cases, then violations, descending.
#[must_use]
pub fn plate_activity(records: &[ViolationRecord], cases: &[TowCase]) -> Vec<PlateActivity> {
    let mut summons: BTreeMap<&PlateKey, HashSet<&str>> = BTreeMap::new();
    for record in records {
        summons
            .entry(&record.key)
            .or_default()
            .insert(&record.summons_number);
    }
    let mut case_numbers: BTreeMap<&PlateKey, HashSet<&str>> = BTreeMap::new();
    for case in cases {
        case_numbers
            .entry(&case.key)
            .or_default()
            .insert(&case.case_number);
    }

    let mut activity: Vec<PlateActivity> = summons
        .into_iter()
        .map(|(key, s)| PlateActivity {
            plate_id: key.plate.clone(),
            state: key.state.clone(),
            license_type: key.license_type.clone(),
            violations: s.len() as u64,
            boots_tows: case_numbers.get(key).map_or(0, |c| c.len() as u64),
        })
        .collect();
    activity.sort_by_key(|a| (Reverse(a.boots_tows), Reverse(a.violations)));
    activity
}
