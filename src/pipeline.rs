use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::config::CleanConfig;
use crate::data::loader::load_file;
use crate::data::model::RecordingTable;
use crate::data::select::classify_columns;
use crate::data::writer::{self, WriteError};
use crate::sessions::{self, DiscoveryError};
use crate::signal::condition::{
    ChannelReport, NormalizationOutcome, filter_channels, normalize_channels,
};

// ---------------------------------------------------------------------------
// Per-file results
// ---------------------------------------------------------------------------

/// Reasons a recording produced no output.  Each is fatal for that file only.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("failed to read {}: {reason:#}", .path.display())]
    Read {
        path: PathBuf,
        reason: anyhow::Error,
    },

    #[error("no EEG columns detected in {}", .path.display())]
    NoEegColumns { path: PathBuf },

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl CleanError {
    /// Short machine-readable kind, used in the JSON summary.
    pub fn kind(&self) -> &'static str {
        match self {
            CleanError::Read { .. } => "read",
            CleanError::NoEegColumns { .. } => "no_eeg_columns",
            CleanError::Write(_) => "write",
        }
    }
}

/// What cleaning one recording did.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub channels: Vec<ChannelReport>,
    pub normalization: NormalizationOutcome,
}

/// Read, classify, condition, normalize and write one recording.
pub fn clean_file(path: &Path, config: &CleanConfig) -> Result<CleanReport, CleanError> {
    let mut table = load_file(path).map_err(|reason| CleanError::Read {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!("{}: {table}", path.display());

    let channels = detect_channels(&table);
    if channels.is_empty() {
        return Err(CleanError::NoEegColumns {
            path: path.to_path_buf(),
        });
    }
    debug!(
        "detected EEG columns: {:?}",
        channels
            .iter()
            .filter_map(|&i| table.column(i).map(|c| c.name.as_str()))
            .collect::<Vec<_>>()
    );

    let channel_reports = filter_channels(
        &mut table,
        &channels,
        &config.band(),
        config.min_finite_samples,
    );

    let normalization = match normalize_channels(&mut table, &channels) {
        Ok(degenerate) => NormalizationOutcome::Applied { degenerate },
        Err(e) => NormalizationOutcome::Failed {
            reason: e.to_string(),
        },
    };

    let output = writer::output_path(path, &config.output_dir, &config.output_prefix)?;
    writer::write_csv(&table, &output)?;

    Ok(CleanReport {
        source: path.to_path_buf(),
        output,
        rows: table.row_count(),
        channels: channel_reports,
        normalization,
    })
}

/// EEG column indices of a loaded table.
pub fn detect_channels(table: &RecordingTable) -> Vec<usize> {
    classify_columns(&table.column_names(), &table.numeric_mask())
}

// ---------------------------------------------------------------------------
// Whole runs
// ---------------------------------------------------------------------------

/// Outcome of one file within a run.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileResult {
    Cleaned(CleanReport),
    Skipped {
        source: PathBuf,
        kind: &'static str,
        error: String,
    },
}

impl FileResult {
    fn from_result(source: &Path, result: Result<CleanReport, CleanError>) -> Self {
        match result {
            Ok(report) => FileResult::Cleaned(report),
            Err(e) => FileResult::Skipped {
                source: source.to_path_buf(),
                kind: e.kind(),
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub sessions: Vec<PathBuf>,
    pub files: Vec<FileResult>,
}

impl RunSummary {
    pub fn cleaned(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileResult::Cleaned(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.files.len() - self.cleaned()
    }
}

/// Clean each file in order; `on_file` is called after every file, before the next starts.
pub fn run_files<F>(paths: &[PathBuf], config: &CleanConfig, mut on_file: F) -> RunSummary
where
    F: FnMut(&Path, &Result<CleanReport, CleanError>),
{
    let files = paths
        .iter()
        .map(|path| {
            let result = clean_file(path, config);
            on_file(path, &result);
            FileResult::from_result(path, result)
        })
        .collect();

    RunSummary {
        sessions: Vec::new(),
        files,
    }
}

/// Recordings of every session under `config.base_dir`, with the sessions they came from.
pub fn discover(config: &CleanConfig) -> Result<(Vec<PathBuf>, Vec<PathBuf>), DiscoveryError> {
    let sessions = sessions::discover_sessions(&config.base_dir, &config.session_prefix)?;
    let recordings = sessions::discover_recordings(&sessions, &config.extensions)?;
    Ok((sessions, recordings))
}

/// Discover all sessions and clean every recording in them.
pub fn run_sessions<F>(config: &CleanConfig, on_file: F) -> Result<RunSummary, DiscoveryError>
where
    F: FnMut(&Path, &Result<CleanReport, CleanError>),
{
    let (sessions, recordings) = discover(config)?;
    let mut summary = run_files(&recordings, config, on_file);
    summary.sessions = sessions;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub numeric: bool,
    pub eeg: bool,
}

#[derive(Debug, Serialize)]
pub struct Inspection {
    pub source: PathBuf,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

/// Load a recording and report how its columns would be classified.
pub fn inspect_file(path: &Path) -> Result<Inspection, CleanError> {
    let table = load_file(path).map_err(|reason| CleanError::Read {
        path: path.to_path_buf(),
        reason,
    })?;
    let channels = detect_channels(&table);
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, col)| ColumnInfo {
            name: col.name.clone(),
            numeric: col.data.is_numeric(),
            eeg: channels.contains(&i),
        })
        .collect();

    Ok(Inspection {
        source: path.to_path_buf(),
        rows: table.row_count(),
        columns,
    })
}
