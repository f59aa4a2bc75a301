pub mod clean;
pub mod inspect;
pub mod run;

use std::path::Path;

use log::{info, warn};

use crate::config::CleanConfig;
use crate::exit_codes;
use crate::output;
use crate::pipeline::{CleanError, CleanReport, FileResult, RunSummary};
use crate::signal::condition::{ChannelOutcome, NormalizationOutcome};

/// Validate the final configuration, printing the problem on failure.
fn check_config(config: &CleanConfig) -> Result<(), i32> {
    config.validate().map_err(|e| {
        eprintln!("Error: {e}");
        exit_codes::INPUT_ERROR
    })
}

/// Per-file progress, logged as soon as a file is done.
fn log_file(path: &Path, result: &Result<CleanReport, CleanError>) {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            warn!("skipping {}: {e}", path.display());
            return;
        }
    };

    for channel in &report.channels {
        match &channel.outcome {
            ChannelOutcome::Filtered => {}
            ChannelOutcome::Skipped { finite } => warn!(
                "{}: column '{}' has only {finite} finite samples, not filtered",
                path.display(),
                channel.column
            ),
            ChannelOutcome::FilterFailed { reason } => warn!(
                "{}: column '{}' could not be filtered: {reason}",
                path.display(),
                channel.column
            ),
        }
    }
    match &report.normalization {
        NormalizationOutcome::Applied { degenerate } if !degenerate.is_empty() => warn!(
            "{}: zero-variance columns could not be normalized: {}",
            path.display(),
            degenerate.join(", ")
        ),
        NormalizationOutcome::Applied { .. } => {}
        NormalizationOutcome::Failed { reason } => {
            warn!("{}: normalization skipped: {reason}", path.display())
        }
    }

    info!(
        "cleaned {} -> {} ({} rows)",
        path.display(),
        report.output.display(),
        report.rows
    );
}

/// Print the summary and pick the exit code for the run.
fn finish(summary: &RunSummary, json: bool) -> i32 {
    if json {
        if let Err(e) = output::print_json(summary) {
            eprintln!("Error: {e:#}");
            return exit_codes::OUTPUT_ERROR;
        }
    } else {
        print_summary(summary);
    }

    if !summary.files.is_empty() && summary.cleaned() == 0 {
        exit_codes::ALL_FAILED
    } else {
        exit_codes::SUCCESS
    }
}

fn print_summary(summary: &RunSummary) {
    for file in &summary.files {
        match file {
            FileResult::Cleaned(report) => {
                let filtered = report
                    .channels
                    .iter()
                    .filter(|c| c.outcome == ChannelOutcome::Filtered)
                    .count();
                println!(
                    "ok    {} -> {} ({} rows, {filtered}/{} channels filtered)",
                    report.source.display(),
                    report.output.display(),
                    report.rows,
                    report.channels.len()
                );
            }
            FileResult::Skipped { source, error, .. } => {
                println!("skip  {}: {error}", source.display());
            }
        }
    }

    let from_sessions = if summary.sessions.is_empty() {
        String::new()
    } else {
        format!(" from {} session(s)", summary.sessions.len())
    };
    println!(
        "Cleaned {} of {} recording(s){from_sessions}, {} skipped",
        summary.cleaned(),
        summary.files.len(),
        summary.skipped()
    );
}
