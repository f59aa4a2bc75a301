use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signal::butterworth::{BandSpec, FilterError};
use crate::signal::condition::DEFAULT_MIN_FINITE_SAMPLES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("min_finite_samples must be at least 1")]
    MinFiniteSamples,

    #[error("at least one recording extension is required")]
    NoExtensions,
}

/// Everything the cleaning pipeline needs; passed explicitly to every entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Directory holding the recording sessions.
    pub base_dir: PathBuf,
    /// Session folders are the subdirectories whose name starts with this.
    pub session_prefix: String,
    /// Recording file extensions, matched case-insensitively.
    pub extensions: Vec<String>,
    pub output_dir: PathBuf,
    /// Prepended to the source file name.
    pub output_prefix: String,
    /// Hz
    pub sample_rate: f64,
    /// Hz
    pub low_cut: f64,
    /// Hz
    pub high_cut: f64,
    pub filter_order: usize,
    /// Channels with fewer finite samples than this are not filtered.
    pub min_finite_samples: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        let base_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_default()
            .join("OpenBCI_GUI")
            .join("Recordings");

        Self {
            base_dir,
            session_prefix: "OpenBCISession_".to_string(),
            extensions: vec!["csv".to_string(), "txt".to_string()],
            output_dir: PathBuf::from("data"),
            output_prefix: "cleaned_".to_string(),
            sample_rate: 255.0,
            low_cut: 1.0,
            high_cut: 50.0,
            filter_order: 4,
            min_finite_samples: DEFAULT_MIN_FINITE_SAMPLES,
        }
    }
}

impl CleanConfig {
    /// Defaults, overlaid with the JSON file at `path` when one is given.
    /// Keys missing from the file keep their default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn band(&self) -> BandSpec {
        BandSpec {
            low: self.low_cut,
            high: self.high_cut,
            sample_rate: self.sample_rate,
            order: self.filter_order,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.band().validate()?;
        if self.min_finite_samples == 0 {
            return Err(ConfigError::MinFiniteSamples);
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }
}
