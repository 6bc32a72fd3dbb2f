//! Subcommand implementations.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use scofftow_analytics::{bins, enforcement, history, plot, runaways, scroll, summary};
use scofftow_analytics_models::{EnforcementReport, FineSummary, PlateEnforcement};
use scofftow_cli_utils::{IndicatifProgress, MultiProgress};
use scofftow_fines::normalize::normalize_violations;
use scofftow_fines::pipeline;
use scofftow_fines_models::{
    PipelineConfig, PlateAggregateRow, RawRecord, ViolationRecord, ViolationRow,
};
use scofftow_ingest::{read_records_from_path, read_rows, write_rows, yearly_fine_paths};
use scofftow_tow::{CaseIndex, normalize_tow_cases};
use scofftow_tow_models::{TowCase, TowCaseRow};
use serde::Serialize;

type CommandResult = Result<(), Box<dyn Error>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnforcementOutput<'a> {
    report: &'a EnforcementReport,
    plates: &'a [PlateEnforcement],
}

/// Arguments of the `plate-history` subcommand.
pub struct HistoryArgs<'a> {
    pub plate: &'a str,
    pub fines: &'a [PathBuf],
    pub cases: &'a Path,
    pub case_year: Option<i32>,
    pub output: Option<&'a Path>,
    pub violations_output: Option<&'a Path>,
    pub activity_output: Option<&'a Path>,
}

fn percent(share: Option<f64>) -> String {
    share.map_or_else(|| "n/a".to_owned(), |s| format!("{:.2}%", s * 100.0))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> CommandResult {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), value)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Reads one raw CSV per path, each behind its own progress bar.
fn read_batches(
    multi: &MultiProgress,
    paths: &[PathBuf],
) -> Result<Vec<Vec<RawRecord>>, Box<dyn Error>> {
    let steps = IndicatifProgress::steps_bar(multi, "Reading files", paths.len() as u64);
    let mut batches = Vec::with_capacity(paths.len());
    for path in paths {
        let bar = IndicatifProgress::records_bar(multi, &path.display().to_string());
        batches.push(read_records_from_path(path, &bar)?);
        bar.finish_and_clear();
        steps.inc(1);
    }
    steps.finish_and_clear();
    Ok(batches)
}

/// Normalizes each fine file separately so duplicates are only dropped
/// within a file, the same way `aggregate` does.
fn load_violations(
    multi: &MultiProgress,
    config: &PipelineConfig,
    paths: &[PathBuf],
) -> Result<Vec<ViolationRecord>, Box<dyn Error>> {
    let mut violations = Vec::new();
    for batch in read_batches(multi, paths)? {
        violations.extend(normalize_violations(&batch, config)?);
    }
    Ok(violations)
}

fn load_cases(path: &Path) -> Result<Vec<TowCase>, Box<dyn Error>> {
    let rows: Vec<TowCaseRow> = read_rows(path)?;
    Ok(rows.into_iter().map(TowCase::from).collect())
}

pub fn aggregate(
    multi: &MultiProgress,
    config: &PipelineConfig,
    input_dir: &Path,
    years: RangeInclusive<i32>,
    output: &Path,
    violations_output: Option<&Path>,
) -> CommandResult {
    let paths = yearly_fine_paths(input_dir, years)?;
    let batches = read_batches(multi, &paths)?;
    let derived = pipeline::run(batches.iter().map(Vec::as_slice), config)?;

    let rows = derived.rows();
    let eligible = rows.iter().filter(|r| r.tow_eligible_date.is_some()).count();
    log::info!("{} plate(s), {eligible} tow-eligible", rows.len());
    write_rows(output, &rows)?;

    if let Some(path) = violations_output {
        write_rows(path, derived.violations.iter().map(ViolationRow::from))?;
    }

    Ok(())
}

pub fn tow_cases(multi: &MultiProgress, input: &Path, output: &Path) -> CommandResult {
    let bar = IndicatifProgress::records_bar(multi, &input.display().to_string());
    let rows = read_records_from_path(input, &bar)?;
    bar.finish_and_clear();

    let cases = normalize_tow_cases(&rows)?;
    write_rows(output, cases.iter().map(TowCaseRow::from))?;
    Ok(())
}

fn print_enforcement(report: &EnforcementReport) {
    println!("Tow-eligible plates:             {}", report.eligible_plates);
    println!(
        "Not towed after eligibility:     {} ({})",
        report.plates_not_towed,
        percent(report.share_not_towed)
    );
    println!(
        "Post-eligibility violations:     {} ({} on plates not towed)",
        report.violations_post_tow_eligible,
        percent(report.share_violations_not_towed)
    );
    println!(
        "Post-eligibility amount due:     ${} ({} on plates not towed)",
        report.amount_due_post_tow_eligible,
        percent(report.share_amount_due_not_towed)
    );
    println!(
        "Violations after eligibility:    {} of all, {} among eligible plates",
        percent(report.share_violations_post_tow_eligible),
        percent(report.share_violations_post_tow_eligible_among_eligible)
    );
    println!();

    let judgement = &report.judgement;
    println!("Plates over threshold in judgement: {}", judgement.plates_over_threshold);
    println!(
        "  with any boot/tow case:           {} ({})",
        judgement.plates_with_case,
        percent(judgement.share_with_case)
    );
    println!("  never towed:                      {}", judgement.plates_never_towed);
    if let Some(mean) = judgement.mean_fines_in_judgement_never_towed {
        println!("  mean fines in judgement:          ${mean:.2}");
    }
}

pub fn enforcement(
    config: &PipelineConfig,
    aggregates: &Path,
    cases: &Path,
    json: Option<&Path>,
    bins_output: Option<&Path>,
) -> CommandResult {
    let rows: Vec<PlateAggregateRow> = read_rows(aggregates)?;
    let index = CaseIndex::first_per_plate(load_cases(cases)?);
    log::info!("{} plate(s), {} plate(s) with a case", rows.len(), index.len());

    let report = enforcement::enforcement_gap(&rows, &index, config.tow_threshold);
    print_enforcement(&report);

    if let Some(path) = json {
        let plates = enforcement::plate_enforcement(&rows, &index);
        write_json(
            path,
            &EnforcementOutput {
                report: &report,
                plates: &plates,
            },
        )?;
    }
    if let Some(path) = bins_output {
        write_rows(
            path,
            bins::violation_bin_table(&rows, &index, config.tow_threshold),
        )?;
    }

    Ok(())
}

pub fn runaways(aggregates: &Path, output: &Path) -> CommandResult {
    let rows: Vec<PlateAggregateRow> = read_rows(aggregates)?;
    let series = runaways::runaway_series(&rows);
    if let Some(last) = series.last() {
        println!(
            "{} plate(s) tow-eligible as of {}",
            last.cumulative_runaways, last.tow_eligible_date
        );
    }
    write_rows(output, &series)?;
    Ok(())
}

pub fn scroll_data(
    aggregates: &Path,
    cases: &Path,
    since: NaiveDate,
    output: &Path,
    json: Option<&Path>,
) -> CommandResult {
    let rows: Vec<PlateAggregateRow> = read_rows(aggregates)?;
    let cases = load_cases(cases)?;

    let report = scroll::scroll_report(&rows, &cases, since);
    let stats = &report.majority_post_eligible;
    println!(
        "Share of plates with most violations after eligibility: {} ({} plates)",
        percent(stats.share),
        stats.plates
    );
    if let (Some(total), Some(post)) = (
        stats.mean_violations,
        stats.mean_violations_post_tow_eligible,
    ) {
        println!("  {total:.2} violations on average, {post:.2} after eligibility");
    }

    write_rows(output, scroll::plates_eligible_since(&rows, since))?;
    if let Some(path) = json {
        write_json(path, &report)?;
    }
    Ok(())
}

pub fn plot_data(
    multi: &MultiProgress,
    config: &PipelineConfig,
    inputs: &[PathBuf],
    output: &Path,
    plates_output: Option<&Path>,
) -> CommandResult {
    let violations = load_violations(multi, config, inputs)?;
    let totals = plot::plate_fine_totals(&violations);
    write_rows(output, plot::fine_bin_table(&totals))?;
    if let Some(path) = plates_output {
        write_rows(path, &totals)?;
    }
    Ok(())
}

pub fn plate_history(
    multi: &MultiProgress,
    config: &PipelineConfig,
    args: &HistoryArgs<'_>,
) -> CommandResult {
    let violations = load_violations(multi, config, args.fines)?;
    let all_cases = load_cases(args.cases)?;
    let cases: Vec<TowCase> = match args.case_year {
        Some(year) => history::booted_in(&all_cases, year).cloned().collect(),
        None => all_cases,
    };

    let timeline = history::plate_timeline(&violations, &cases, args.plate);
    log::info!("{} event(s) for plate {}", timeline.len(), args.plate);

    if let Some(path) = args.output {
        write_rows(path, &timeline)?;
    } else {
        for event in &timeline {
            println!(
                "{}/{}/{} {} {}",
                event.plate_id,
                event.state,
                event.license_type,
                event.dt.map_or_else(|| "----------".to_owned(), |d| d.to_string()),
                event.kind
            );
        }
    }

    if let Some(path) = args.violations_output {
        write_rows(
            path,
            violations
                .iter()
                .filter(|v| v.key.plate == args.plate)
                .map(ViolationRow::from),
        )?;
    }
    if let Some(path) = args.activity_output {
        write_rows(path, history::plate_activity(&violations, &cases))?;
    }

    Ok(())
}

fn print_summary(summary: &FineSummary) {
    println!("Violations:   {}", summary.violations);
    println!("Total fines:  ${}", summary.total_fines);
    println!(
        "Amount due:   ${} ({})",
        summary.amount_due,
        summary
            .percent_owed
            .map_or_else(|| "n/a".to_owned(), |p| format!("{p:.2}%"))
    );
    println!(
        "Amount paid:  ${} ({})",
        summary.payment_amount,
        summary
            .percent_paid
            .map_or_else(|| "n/a".to_owned(), |p| format!("{p:.2}%"))
    );
}

pub fn summary(
    multi: &MultiProgress,
    config: &PipelineConfig,
    inputs: &[PathBuf],
    json: Option<&Path>,
) -> CommandResult {
    let violations = load_violations(multi, config, inputs)?;
    let summary = summary::fine_summary(&violations);
    print_summary(&summary);
    if let Some(path) = json {
        write_json(path, &summary)?;
    }
    Ok(())
}
