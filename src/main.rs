use std::path::Path;

use clap::Parser;

mod cli;
mod commands;
mod config;
mod data;
mod exit_codes;
mod output;
mod pipeline;
mod sessions;
mod signal;

use cli::Cli;
use config::CleanConfig;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let config_path = cli.config.as_deref();
    let exit_code = match cli.command {
        cli::Command::Run(args) => {
            with_config(config_path, |config| commands::run::execute(args, config))
        }
        cli::Command::Clean(args) => {
            with_config(config_path, |config| commands::clean::execute(args, config))
        }
        cli::Command::Inspect(args) => commands::inspect::execute(args),
    };

    std::process::exit(exit_code);
}

/// Load the configuration file (or defaults) and hand it to `command`.
fn with_config(path: Option<&Path>, command: impl FnOnce(CleanConfig) -> i32) -> i32 {
    match CleanConfig::load(path) {
        Ok(config) => command(config),
        Err(e) => {
            eprintln!("Error: {e}");
            exit_codes::INPUT_ERROR
        }
    }
}
