use crate::cli::InspectArgs;
use crate::exit_codes;
use crate::output;
use crate::pipeline::{self, Inspection};

pub fn execute(args: InspectArgs) -> i32 {
    let inspection = match pipeline::inspect_file(&args.file) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_codes::INPUT_ERROR;
        }
    };

    if args.json {
        if let Err(e) = output::print_json(&inspection) {
            eprintln!("Error: {e:#}");
            return exit_codes::OUTPUT_ERROR;
        }
    } else {
        print_inspection(&inspection);
    }
    exit_codes::SUCCESS
}

fn print_inspection(inspection: &Inspection) {
    println!(
        "{}: {} rows x {} columns",
        inspection.source.display(),
        inspection.rows,
        inspection.columns.len()
    );

    let width = inspection
        .columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for col in &inspection.columns {
        let marker = if col.eeg { "[eeg]" } else { "     " };
        let kind = if col.numeric { "numeric" } else { "text" };
        println!("  {marker} {:<width$}  {kind}", col.name);
    }

    let eeg: Vec<&str> = inspection
        .columns
        .iter()
        .filter(|c| c.eeg)
        .map(|c| c.name.as_str())
        .collect();
    if eeg.is_empty() {
        println!("EEG channels: none");
    } else {
        println!("EEG channels: {}", eeg.join(", "));
    }
}
