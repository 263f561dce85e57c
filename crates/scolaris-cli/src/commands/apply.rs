//! Apply command - replay correction memory and auto-fixes, export results.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use super::{load_registry, open_session};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    rules: PathBuf,
    memory: Option<PathBuf>,
    output: Option<PathBuf>,
    log: Option<PathBuf>,
    clean_only: bool,
    label_column: Option<String>,
    import_type: String,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(&rules)?;
    let mut session = open_session(&file, registry, import_type, label_column, None)?;

    if let Some(memory_path) = &memory {
        let json = fs::read_to_string(memory_path)?;
        let imported = session.memory_mut().import_json(&json)?;
        if verbose {
            println!("Loaded {} correction rules from {}", imported, memory_path.display());
        }
    }

    session.validate()?;
    let replayed = session.replay_memory()?;

    // Re-validate so auto-fixes only target still-broken cells.
    session.validate()?;
    let patterns = session.analyze()?;
    let mut bulk_fixed = 0;
    for pattern in patterns.iter().filter(|p| p.can_auto_fix) {
        bulk_fixed += session.apply_pattern(pattern)?;
    }

    session.validate()?;
    let summary = session.validation_summary();

    println!(
        "{} {} replayed, {} bulk-fixed, {} findings remain",
        "Applied".cyan().bold(),
        replayed.to_string().white().bold(),
        bulk_fixed.to_string().white().bold(),
        summary.total.to_string().white().bold()
    );

    let output_path = output.unwrap_or_else(|| {
        let stem = file.file_stem().unwrap_or_default().to_string_lossy();
        file.with_file_name(format!("{}_cleaned.csv", stem))
    });
    let cleaned = session.export_cleaned(clean_only)?;
    fs::write(&output_path, cleaned)?;
    println!("Cleaned data written to {}", output_path.display().to_string().cyan());

    if let Some(log_path) = log {
        fs::write(&log_path, session.export_changelog()?)?;
        println!(
            "Change log ({} entries) written to {}",
            session.change_log().entries().len(),
            log_path.display().to_string().cyan()
        );
    }

    Ok(())
}
