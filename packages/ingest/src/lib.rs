#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV input and output for the fine and tow case tables.
//!
//! Raw inputs are read into [`RawRecord`] maps keyed by normalized column
//! names (`"Plate ID"` becomes `"plate_id"`) with trimmed values. Processed
//! tables are written from and read back into `serde` row types.

pub mod progress;

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scofftow_fines_models::RawRecord;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::progress::ProgressCallback;

/// First calendar year with a yearly fine file.
pub const FIRST_FINE_YEAR: i32 = 2015;

/// Last calendar year with a yearly fine file.
pub const LAST_FINE_YEAR: i32 = 2025;

/// Errors that can occur while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV parsing or serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An expected input file does not exist.
    #[error("Missing input file: {}", path.display())]
    MissingInput {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The input has no header row.
    #[error("CSV input '{label}' contains no header row")]
    EmptyHeader {
        /// Label of the input (usually its path).
        label: String,
    },
}

/// Lowercases a column name and replaces spaces with underscores.
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Reads every row of a CSV into a [`RawRecord`].
///
/// Short rows are padded with empty values; extra trailing fields are
/// ignored.
///
/// # Errors
///
/// Returns [`IngestError::EmptyHeader`] if there is no header row, or
/// [`IngestError::Csv`] if the input is not valid CSV.
pub fn read_records<R: Read>(
    reader: R,
    label: &str,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_column_name)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyHeader {
            label: label.to_owned(),
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                (
                    header.clone(),
                    record.get(i).unwrap_or("").trim().to_owned(),
                )
            })
            .collect();
        records.push(row);
        progress.inc(1);
    }

    log::info!("Parsed {} records from {label}", records.len());

    Ok(records)
}

/// Reads a CSV file with [`read_records`].
///
/// # Errors
///
/// Returns [`IngestError::MissingInput`] if the file does not exist, or any
/// error from [`read_records`].
pub fn read_records_from_path(
    path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<RawRecord>, IngestError> {
    if !path.is_file() {
        return Err(IngestError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    read_records(file, &path.display().to_string(), progress)
}

/// File name of the yearly school-zone fine extract.
#[must_use]
pub fn fine_file_name(year: i32) -> String {
    format!("school_zone_fines_{year}.csv")
}

/// Resolves the yearly fine files under `dir`, in the given year order.
///
/// # Errors
///
/// Returns [`IngestError::MissingInput`] naming the first absent file.
pub fn yearly_fine_paths(
    dir: &Path,
    years: impl IntoIterator<Item = i32>,
) -> Result<Vec<PathBuf>, IngestError> {
    years
        .into_iter()
        .map(|year| {
            let path = dir.join(fine_file_name(year));
            if path.is_file() {
                Ok(path)
            } else {
                Err(IngestError::MissingInput { path })
            }
        })
        .collect()
}

/// Serializes rows as CSV with a header row. Returns the row count.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if a row cannot be serialized or written.
pub fn write_rows_to<W: Write, T: Serialize>(
    writer: W,
    rows: impl IntoIterator<Item = T>,
) -> Result<u64, IngestError> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Writes rows to a CSV file, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be created, or any error
/// from [`write_rows_to`].
pub fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<u64, IngestError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let count = write_rows_to(File::create(path)?, rows)?;
    log::info!("Wrote {count} rows to {}", path.display());
    Ok(count)
}

/// Deserializes every CSV row into `T`.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if a row does not match `T`.
pub fn read_rows_from<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, IngestError> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(IngestError::from)
}

/// Reads a processed CSV file into `T` rows.
///
/// # Errors
///
/// Returns [`IngestError::MissingInput`] if the file does not exist, or any
/// error from [`read_rows_from`].
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, IngestError> {
    if !path.is_file() {
        return Err(IngestError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let rows = read_rows_from(File::open(path)?)?;
    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use scofftow_fines_models::{Money, PlateAggregateRow};

    use super::*;
    use crate::progress::null_progress;

    #[test]
    fn normalizes_column_names() {
        assert_eq!(normalize_column_name(" Plate ID "), "plate_id");
        assert_eq!(normalize_column_name("Tow (Y/N)"), "tow_(y/n)");
        assert_eq!(normalize_column_name("amount_due"), "amount_due");
    }

    #[test]
    fn reads_records_with_normalized_headers() {
        let csv = "Plate,State,Fine Amount\n ABC123 ,NY, 115 \nXYZ,NJ\n";
        let records = read_records(csv.as_bytes(), "test", &null_progress()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["plate"], "ABC123");
        assert_eq!(records[0]["fine_amount"], "115");
        assert_eq!(records[1]["fine_amount"], "");
    }

    #[derive(Default)]
    struct CountingProgress(std::sync::atomic::AtomicU64);

    impl ProgressCallback for CountingProgress {
        fn inc(&self, delta: u64) {
            self.0.fetch_add(delta, std::sync::atomic::Ordering::Relaxed);
        }
        fn finish_and_clear(&self) {}
    }

    #[test]
    fn reports_one_increment_per_row() {
        let counter = Arc::new(CountingProgress::default());
        let progress: Arc<dyn ProgressCallback> = counter.clone();
        let csv = "plate,state\nA,NY\nB,NJ\nC,CT\n";

        read_records(csv.as_bytes(), "test", &progress).unwrap();

        assert_eq!(counter.0.load(std::sync::atomic::Ordering::Relaxed), 3);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_records("".as_bytes(), "empty", &null_progress()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyHeader { .. }));
    }

    #[test]
    fn missing_yearly_file_is_reported() {
        let dir = std::env::temp_dir().join("scofftow_ingest_missing_years");
        let err = yearly_fine_paths(&dir, [2015]).unwrap_err();
        match err {
            IngestError::MissingInput { path } => {
                assert!(path.ends_with("school_zone_fines_2015.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn writes_and_reads_aggregate_rows() {
        let row = PlateAggregateRow {
            plate: "LER5337".to_owned(),
            state: "NY".to_owned(),
            license_type: "PAS".to_owned(),
            tow_eligible_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            total_fines: Money::from_dollars(450),
            amount_paid: Money::ZERO,
            amount_due: Money::from_dollars(450),
            violations: 3,
            fines_in_judgement: Money::from_dollars(400),
            total_fines_post_tow_eligible: Money::ZERO,
            amount_paid_post_tow_eligible: Money::ZERO,
            amount_due_post_tow_eligible: Money::ZERO,
            violations_post_tow_eligible: 0,
        };
        let unset = PlateAggregateRow {
            tow_eligible_date: None,
            ..row.clone()
        };

        let mut buffer = Vec::new();
        let count = write_rows_to(&mut buffer, [&row, &unset]).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("plate,state,license_type,tow_eligible_date,total_fines,"));
        assert!(text.contains("LER5337,NY,PAS,2024-03-01,450.00,0.00,450.00,3,400.00,"));

        let back: Vec<PlateAggregateRow> = read_rows_from(buffer.as_slice()).unwrap();
        assert_eq!(back, vec![row, unset]);
    }
}
