//! Status command - inspect (and optionally clear) the persisted rule store.

use std::path::PathBuf;

use colored::Colorize;
use scolaris::{CorrectionMemory, FileStore, KeyValueStore};

pub fn run(
    store: PathBuf,
    import_type: String,
    clear: bool,
    yes: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FileStore::open(&store)?;

    if clear {
        if !yes {
            return Err(
                "Refusing to clear stored rules without --yes (this cannot be undone)".into(),
            );
        }
        let removed = CorrectionMemory::clear_saved(&mut store, &import_type, yes)?;
        println!(
            "{} {} stored rules for import-type '{}'",
            "Cleared".cyan().bold(),
            removed.to_string().white().bold(),
            import_type
        );
        return Ok(());
    }

    let memory = CorrectionMemory::load_from_store(&store, &import_type);
    println!(
        "{} {} stored rules for import-type '{}'",
        "Status".cyan().bold(),
        memory.len().to_string().white().bold(),
        import_type
    );

    if verbose {
        for rule in memory.rules() {
            println!(
                "  {}: '{}' -> '{}'",
                rule.column, rule.original_value, rule.corrected_value
            );
        }
        let other_keys = store
            .keys_with_prefix("rules/")
            .into_iter()
            .filter(|k| !k.starts_with(&format!("rules/{import_type}/")))
            .count();
        if other_keys > 0 {
            println!("  ({} entries under other import-types)", other_keys);
        }
    }

    Ok(())
}
