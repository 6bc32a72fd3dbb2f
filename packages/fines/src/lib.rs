#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fine normalization, tow-eligibility derivation, and plate aggregation.
//!
//! The pipeline runs in three steps over an in-memory table of violations:
//!
//! 1. [`normalize`] turns raw rows into deduplicated [`ViolationRecord`]s
//!    with `total_fine` and `in_judgement` derived against an explicit
//!    as-of date.
//! 2. [`threshold`] finds, per plate, the violation at which the running
//!    in-judgement balance first exceeds the tow threshold.
//! 3. [`aggregate`] collapses each plate's violations into overall,
//!    in-judgement, and post-eligibility totals.
//!
//! [`pipeline::run`] chains all three.
//!
//! [`ViolationRecord`]: scofftow_fines_models::ViolationRecord

pub mod aggregate;
pub mod config;
pub mod normalize;
pub mod parsing;
pub mod pipeline;
pub mod threshold;

use thiserror::Error;

/// Errors that can occur while deriving plate aggregates.
#[derive(Debug, Error)]
pub enum FinesError {
    /// A required column is absent from an input row.
    #[error("Missing required column '{column}' in row {row}")]
    MissingColumn {
        /// Normalized column name.
        column: String,
        /// 1-based data row number.
        row: usize,
    },

    /// A currency column holds a value that is not an amount.
    #[error("Invalid amount {value:?} in column '{column}' at row {row}")]
    InvalidAmount {
        /// Normalized column name.
        column: String,
        /// 1-based data row number.
        row: usize,
        /// The offending cell value.
        value: String,
    },

    /// Configuration value could not be interpreted.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration file is not valid TOML.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (reading a config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
