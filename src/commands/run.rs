use log::{debug, info};

use super::{check_config, finish, log_file};
use crate::cli::RunArgs;
use crate::config::CleanConfig;
use crate::exit_codes;
use crate::output;
use crate::pipeline;

pub fn execute(args: RunArgs, mut config: CleanConfig) -> i32 {
    args.apply(&mut config);
    if let Err(code) = check_config(&config) {
        return code;
    }
    debug!("{config:?}");

    if args.dry_run {
        return dry_run(&config, args.json);
    }

    info!("scanning {}", config.base_dir.display());
    match pipeline::run_sessions(&config, log_file) {
        Ok(summary) => finish(&summary, args.json),
        Err(e) => {
            eprintln!("Error: {e}");
            exit_codes::INPUT_ERROR
        }
    }
}

fn dry_run(config: &CleanConfig, json: bool) -> i32 {
    let (sessions, recordings) = match pipeline::discover(config) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_codes::INPUT_ERROR;
        }
    };

    if json {
        if let Err(e) = output::print_json(&recordings) {
            eprintln!("Error: {e:#}");
            return exit_codes::OUTPUT_ERROR;
        }
    } else {
        for file in &recordings {
            println!("{}", file.display());
        }
    }
    eprintln!(
        "Found {} recording(s) in {} session(s)",
        recordings.len(),
        sessions.len()
    );
    exit_codes::SUCCESS
}
