//! Analyze command - detect systematic, bulk-fixable error patterns.

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

    let violations = session.validate()?.len();
    let patterns = session.analyze()?;

    println!(
        "{} {} findings, {} patterns",
        "Analyzed".cyan().bold(),
        violations.to_string().white().bold(),
        patterns.len().to_string().white().bold()
    );

    for pattern in &patterns {
        let marker = if pattern.can_auto_fix {
            "auto-fixable".green().bold()
        } else {
            "manual".yellow().bold()
        };
        println!(
            "  [{}] {} ({} rows)",
            marker,
            pattern.description,
            pattern.occurrences()
        );
        if verbose {
            println!("        rows: {:?}", pattern.affected_rows);
        }
    }

    if patterns.is_empty() {
        println!("No systematic patterns; remaining findings need row-by-row review.");
    }

    Ok(())
}
