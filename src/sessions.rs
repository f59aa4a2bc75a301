use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("base directory not found: {}", .0.display())]
    BaseDirMissing(PathBuf),

    #[error("reading {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no session folders starting with '{prefix}' in {}", .base_dir.display())]
    NoSessions { base_dir: PathBuf, prefix: String },

    #[error("no recordings with extension {extensions} in any session folder")]
    NoRecordings { extensions: String },
}

/// Session folders directly under `base_dir` whose name starts with `prefix`,
/// sorted by name.
pub fn discover_sessions(base_dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !base_dir.is_dir() {
        return Err(DiscoveryError::BaseDirMissing(base_dir.to_path_buf()));
    }

    let mut sessions: Vec<PathBuf> = list_dir(base_dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    sessions.sort();

    if sessions.is_empty() {
        return Err(DiscoveryError::NoSessions {
            base_dir: base_dir.to_path_buf(),
            prefix: prefix.to_string(),
        });
    }
    Ok(sessions)
}

/// Recording files directly inside each session, in session order and sorted
/// by name within a session.
pub fn discover_recordings(
    sessions: &[PathBuf],
    extensions: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut recordings = Vec::new();
    for session in sessions {
        let mut files: Vec<PathBuf> = list_dir(session)?
            .into_iter()
            .filter(|p| p.is_file() && has_extension(p, extensions))
            .collect();
        files.sort();
        recordings.extend(files);
    }

    if recordings.is_empty() {
        return Err(DiscoveryError::NoRecordings {
            extensions: extensions.join("/"),
        });
    }
    Ok(recordings)
}

pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_err = |source: std::io::Error| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(read_err))
        .collect()
}
