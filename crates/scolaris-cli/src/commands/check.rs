//! Check command - validate an import file against a rule registry.

use std::path::PathBuf;

use colored::Colorize;

use super::{load_registry, open_session};

pub fn run(
    file: PathBuf,
    rules: PathBuf,
    import_type: String,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(&rules)?;
    let mut session = open_session(&file, registry, import_type, None, None)?;

    let violations = session.validate()?.to_vec();
    let summary = session.validation_summary();

    println!(
        "{} {} rows, {} findings in {} rows",
        "Checked".cyan().bold(),
        summary.total_rows.to_string().white().bold(),
        summary.total.to_string().white().bold(),
        summary.rows_with_violations
    );

    for (kind, count) in &summary.by_kind {
        println!("  {:>5}  {}", count, kind);
    }

    if verbose {
        println!();
        for v in &violations {
            println!(
                "{} row {} '{}': {} ({})",
                "finding".yellow(),
                v.row + 1,
                v.column,
                v.message,
                v.original_value
            );
        }
    }

    if summary.is_clean() {
        println!("{} No findings. File is ready for export.", "OK".green().bold());
    }

    Ok(())
}
