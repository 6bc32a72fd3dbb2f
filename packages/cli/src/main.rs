#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the school-zone fine and tow pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`scofftow_cli_utils::init_logger`])
//! so that log lines and progress bars share the terminal.

mod commands;

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use scofftow_fines::FinesError;
use scofftow_fines::config::{ConfigLayer, load_config};
use scofftow_fines_models::{Money, PipelineConfig};
use scofftow_ingest::{FIRST_FINE_YEAR, LAST_FINE_YEAR};

#[derive(Parser)]
#[command(
    name = "scofftow",
    about = "School-zone camera fines, tow eligibility, and enforcement reports"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the pipeline configuration. Unset flags fall back to the
/// `SCOFFTOW_*` environment variables, then the config file, then defaults.
#[derive(Args)]
struct ConfigArgs {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Reference date for judgement status (default: today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    /// Days after issue before an unpaid violation is in judgement
    #[arg(long, global = true)]
    judgement_age_days: Option<i64>,
    /// Dollar amount of in-judgement fines that makes a plate tow-eligible
    #[arg(long, global = true)]
    tow_threshold: Option<Money>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<PipelineConfig, FinesError> {
        let cli = ConfigLayer {
            as_of: self.as_of,
            judgement_age_days: self.judgement_age_days,
            tow_threshold: self.tow_threshold,
        };
        load_config(
            self.config.as_deref(),
            cli,
            chrono::Local::now().date_naive(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Derive judgement status and tow eligibility from the yearly fine
    /// files and write the per-plate aggregate
    Aggregate {
        /// Directory holding `school_zone_fines_{year}.csv`
        #[arg(long, default_value = "data/raw")]
        input_dir: PathBuf,
        /// First year to read
        #[arg(long, default_value_t = FIRST_FINE_YEAR)]
        from_year: i32,
        /// Last year to read (inclusive)
        #[arg(long, default_value_t = LAST_FINE_YEAR)]
        to_year: i32,
        /// Plate aggregate output
        #[arg(long, default_value = "data/processed/fine_agg.csv")]
        output: PathBuf,
        /// Also write the normalized, deduplicated violations here
        #[arg(long)]
        violations_output: Option<PathBuf>,
    },
    /// Normalize the raw scofflaw tow case export
    TowCases {
        /// Raw case CSV
        input: PathBuf,
        /// Processed case output
        #[arg(long, default_value = "data/processed/scofftow_case_information.csv")]
        output: PathBuf,
    },
    /// Report how many tow-eligible plates were never towed
    Enforcement {
        /// Plate aggregate CSV
        #[arg(long, default_value = "data/processed/fine_agg.csv")]
        aggregates: PathBuf,
        /// Processed case CSV
        #[arg(long, default_value = "data/processed/scofftow_case_information.csv")]
        cases: PathBuf,
        /// Write the report and per-plate outcomes as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the violation-bin table as CSV
        #[arg(long)]
        bins: Option<PathBuf>,
    },
    /// Plates becoming tow-eligible per day
    Runaways {
        /// Plate aggregate CSV
        #[arg(long, default_value = "data/processed/fine_agg.csv")]
        aggregates: PathBuf,
        /// Series output
        #[arg(long, default_value = "data/processed/runaways.csv")]
        output: PathBuf,
    },
    /// Recent eligibility versus recent boots and tows
    ScrollData {
        /// Plate aggregate CSV
        #[arg(long, default_value = "data/processed/fine_agg.csv")]
        aggregates: PathBuf,
        /// Processed case CSV
        #[arg(long, default_value = "data/processed/scofftow_case_information.csv")]
        cases: PathBuf,
        /// Only plates eligible (and actions taken) on or after this date
        #[arg(long, default_value = "2024-01-01")]
        since: NaiveDate,
        /// Eligible plates output
        #[arg(long, default_value = "static/data/plates_to_tow.csv")]
        output: PathBuf,
        /// Write both date series and the summary stats as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Fine payment behaviour binned by violations per plate
    PlotData {
        /// Raw yearly fine CSV(s)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Bin table output
        #[arg(long, default_value = "static/data/bar_plot_data.csv")]
        output: PathBuf,
        /// Also write the per-plate totals
        #[arg(long)]
        plates_output: Option<PathBuf>,
    },
    /// Fine, boot, and tow timeline for one plate
    PlateHistory {
        /// Plate number
        plate: String,
        /// Raw yearly fine CSV(s)
        #[arg(long = "fines", required = true)]
        fines: Vec<PathBuf>,
        /// Processed case CSV
        #[arg(long, default_value = "data/processed/scofftow_case_information.csv")]
        cases: PathBuf,
        /// Only cases booted in this year
        #[arg(long)]
        case_year: Option<i32>,
        /// Timeline output (printed when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the plate's violations as CSV
        #[arg(long)]
        violations_output: Option<PathBuf>,
        /// Write distinct violation and case counts for every plate
        #[arg(long)]
        activity_output: Option<PathBuf>,
    },
    /// Share of fines owed versus paid
    Summary {
        /// Raw yearly fine CSV(s)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Write the summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = scofftow_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = cli.config.resolve()?;
    let start = Instant::now();

    match cli.command {
        Commands::Aggregate {
            input_dir,
            from_year,
            to_year,
            output,
            violations_output,
        } => commands::aggregate(
            &multi,
            &config,
            &input_dir,
            from_year..=to_year,
            &output,
            violations_output.as_deref(),
        )?,
        Commands::TowCases { input, output } => commands::tow_cases(&multi, &input, &output)?,
        Commands::Enforcement {
            aggregates,
            cases,
            json,
            bins,
        } => commands::enforcement(
            &config,
            &aggregates,
            &cases,
            json.as_deref(),
            bins.as_deref(),
        )?,
        Commands::Runaways { aggregates, output } => commands::runaways(&aggregates, &output)?,
        Commands::ScrollData {
            aggregates,
            cases,
            since,
            output,
            json,
        } => commands::scroll_data(&aggregates, &cases, since, &output, json.as_deref())?,
        Commands::PlotData {
            inputs,
            output,
            plates_output,
        } => commands::plot_data(&multi, &config, &inputs, &output, plates_output.as_deref())?,
        Commands::PlateHistory {
            plate,
            fines,
            cases,
            case_year,
            output,
            violations_output,
            activity_output,
        } => commands::plate_history(
            &multi,
            &config,
            &commands::HistoryArgs {
                plate: &plate,
                fines: &fines,
                cases: &cases,
                case_year,
                output: output.as_deref(),
                violations_output: violations_output.as_deref(),
                activity_output: activity_output.as_deref(),
            },
        )?,
        Commands::Summary { inputs, json } => {
            commands::summary(&multi, &config, &inputs, json.as_deref())?;
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
