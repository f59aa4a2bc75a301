use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CleanConfig;

#[derive(Parser)]
#[command(
    name = "eegclean",
    version,
    about = "Clean OpenBCI EEG recordings: band-pass filter and z-score normalize",
    long_about = "Clean OpenBCI GUI recordings (CSV, TXT or Parquet).\n\
                  EEG channels are detected from the column headers, band-pass filtered \
                  with a zero-phase Butterworth filter, z-score normalized and written \
                  back out as CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file; command-line flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover recording sessions and clean every recording in them
    Run(RunArgs),
    /// Clean the given recording files
    Clean(CleanArgs),
    /// Show the columns of a recording and which would be treated as EEG
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Directory holding the session folders
    #[arg(long, env = "EEGCLEAN_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Session folder name prefix
    #[arg(long)]
    pub session_prefix: Option<String>,

    /// Recording file extensions to pick up (e.g. csv txt parquet)
    #[arg(long = "ext", num_args = 1..)]
    pub extensions: Vec<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// List the recordings that would be cleaned, without cleaning them
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Recording files to clean
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Recording file to inspect
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Default)]
pub struct FilterArgs {
    /// Sampling rate in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Band-pass low cutoff in Hz
    #[arg(long)]
    pub low_cut: Option<f64>,

    /// Band-pass high cutoff in Hz
    #[arg(long)]
    pub high_cut: Option<f64>,

    /// Butterworth order
    #[arg(long)]
    pub order: Option<usize>,

    /// Minimum finite samples a channel needs to be filtered
    #[arg(long)]
    pub min_finite: Option<usize>,
}

#[derive(Args, Default)]
pub struct OutputArgs {
    /// Directory cleaned files are written to
    #[arg(long, env = "EEGCLEAN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Prefix added to each output file name
    #[arg(long)]
    pub prefix: Option<String>,
}

impl FilterArgs {
    pub fn apply(&self, config: &mut CleanConfig) {
        if let Some(v) = self.sample_rate {
            config.sample_rate = v;
        }
        if let Some(v) = self.low_cut {
            config.low_cut = v;
        }
        if let Some(v) = self.high_cut {
            config.high_cut = v;
        }
        if let Some(v) = self.order {
            config.filter_order = v;
        }
        if let Some(v) = self.min_finite {
            config.min_finite_samples = v;
        }
    }
}

impl OutputArgs {
    pub fn apply(&self, config: &mut CleanConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.output_prefix = prefix.clone();
        }
    }
}

impl RunArgs {
    pub fn apply(&self, config: &mut CleanConfig) {
        if let Some(dir) = &self.base_dir {
            config.base_dir = dir.clone();
        }
        if let Some(prefix) = &self.session_prefix {
            config.session_prefix = prefix.clone();
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        self.filter.apply(config);
        self.output.apply(config);
    }
}

impl CleanArgs {
    pub fn apply(&self, config: &mut CleanConfig) {
        self.filter.apply(config);
        self.output.apply(config);
    }
}
