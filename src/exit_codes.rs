/// Everything ran; individual files may still have been skipped.
pub const SUCCESS: i32 = 0;
/// Bad configuration, missing base directory, nothing to process, or an
/// unreadable file given to `inspect`.
pub const INPUT_ERROR: i32 = 1;
/// Every file of the run failed.
pub const ALL_FAILED: i32 = 2;
/// Results could not be written to stdout.
pub const OUTPUT_ERROR: i32 = 3;
