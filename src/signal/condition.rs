use log::debug;
use serde::Serialize;
use thiserror::Error;

use super::butterworth::{BandSpec, bandpass_filtfilt};
use crate::data::model::RecordingTable;

/// Default minimum number of finite samples a channel needs before it is filtered.
pub const DEFAULT_MIN_FINITE_SAMPLES: usize = 10;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one selected channel during filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Filtered,
    /// Too few finite samples; values were only coerced to numeric.
    Skipped { finite: usize },
    /// The filter rejected the channel; values were only coerced to numeric.
    FilterFailed { reason: String },
}

/// Per-channel report entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub column: String,
    #[serde(flatten)]
    pub outcome: ChannelOutcome,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("need at least 2 rows to estimate a standard deviation, table has {0}")]
    InsufficientRows(usize),

    #[error("column index {0} is out of range")]
    UnknownColumn(usize),
}

/// Result of normalizing the selected channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalizationOutcome {
    /// Applied to every channel; `degenerate` lists columns with zero variance
    /// or fewer than two finite samples, which are left non-finite.
    Applied { degenerate: Vec<String> },
    /// Nothing was normalized.
    Failed { reason: String },
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Coerce, gap-fill and band-pass each selected column in place.
///
/// Columns with fewer than `min_finite` finite samples, and columns the filter
/// rejects, keep their coerced values.  Failures never propagate past the
/// channel they happened on.
pub fn filter_channels(
    table: &mut RecordingTable,
    channels: &[usize],
    band: &BandSpec,
    min_finite: usize,
) -> Vec<ChannelReport> {
    let mut reports = Vec::with_capacity(channels.len());

    for &idx in channels {
        let Some(column) = table.column(idx) else {
            continue;
        };
        let name = column.name.clone();
        let coerced = column.data.to_numeric();

        let finite = coerced.iter().filter(|v| v.is_finite()).count();
        let (values, outcome) = if finite < min_finite {
            (coerced, ChannelOutcome::Skipped { finite })
        } else {
            match bandpass_filtfilt(&fill_gaps(&coerced), band) {
                Ok(filtered) => (filtered, ChannelOutcome::Filtered),
                Err(e) => (
                    coerced,
                    ChannelOutcome::FilterFailed {
                        reason: e.to_string(),
                    },
                ),
            }
        };
        debug!("{name}: {outcome:?}");

        // Lengths are preserved by every branch above.
        if table.set_numeric(idx, values).is_ok() {
            reports.push(ChannelReport {
                column: name,
                outcome,
            });
        }
    }
    reports
}

/// Forward-fill then backward-fill `NaN` gaps.  Infinities are left alone.
pub fn fill_gaps(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();

    let mut last = None;
    for v in out.iter_mut() {
        if v.is_nan() {
            if let Some(prev) = last {
                *v = prev;
            }
        } else {
            last = Some(*v);
        }
    }

    let mut next = None;
    for v in out.iter_mut().rev() {
        if v.is_nan() {
            if let Some(following) = next {
                *v = following;
            }
        } else {
            next = Some(*v);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Z-score every selected column: `(x - mean) / std`, with the mean and the
/// sample standard deviation taken over finite values only.
///
/// All statistics are computed before anything is written, so an error leaves
/// the table untouched.  Degenerate columns end up non-finite.
pub fn normalize_channels(
    table: &mut RecordingTable,
    channels: &[usize],
) -> Result<Vec<String>, NormalizeError> {
    let rows = table.row_count();
    if rows < 2 {
        return Err(NormalizeError::InsufficientRows(rows));
    }

    let mut updates = Vec::with_capacity(channels.len());
    let mut degenerate = Vec::new();
    for &idx in channels {
        let column = table.column(idx).ok_or(NormalizeError::UnknownColumn(idx))?;
        let values = column.data.to_numeric();
        let (mean, std) = mean_std(&values);
        if !(std.is_finite() && std > 0.0) {
            degenerate.push(column.name.clone());
        }
        updates.push((idx, values.iter().map(|v| (v - mean) / std).collect()));
    }

    for (idx, values) in updates {
        table
            .set_numeric(idx, values)
            .map_err(|_| NormalizeError::UnknownColumn(idx))?;
    }
    Ok(degenerate)
}

/// Mean and sample standard deviation (n - 1) of the finite values.
/// Returns `NaN` for statistics that are undefined.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = finite.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, f64::NAN);
    }
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, var.sqrt())
}
