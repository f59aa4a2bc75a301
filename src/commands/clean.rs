use log::debug;

use super::{check_config, finish, log_file};
use crate::cli::CleanArgs;
use crate::config::CleanConfig;
use crate::pipeline;

pub fn execute(args: CleanArgs, mut config: CleanConfig) -> i32 {
    args.apply(&mut config);
    if let Err(code) = check_config(&config) {
        return code;
    }
    debug!("{config:?}");

    let summary = pipeline::run_files(&args.files, &config, log_file);
    finish(&summary, args.json)
}
