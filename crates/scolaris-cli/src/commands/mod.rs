//! CLI command implementations.

pub mod analyze;
pub mod apply;
pub mod check;
pub mod status;

use std::fs;
use std::path::Path;

use scolaris::{HeaderMapping, ImportSession, RuleRegistry, SessionConfig};

/// Load a rule registry from a JSON file.
pub fn load_registry(path: &Path) -> Result<RuleRegistry, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Rule file not found: {}", path.display()).into());
    }
    let json = fs::read_to_string(path)?;
    Ok(RuleRegistry::from_json(&json)?)
}

/// Build a session for a file + registry and load the file.
pub fn open_session(
    file: &Path,
    registry: RuleRegistry,
    import_type: String,
    label_column: Option<String>,
    mapping: Option<HeaderMapping>,
) -> Result<ImportSession, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Import file not found: {}", file.display()).into());
    }

    let mut session = ImportSession::new(SessionConfig {
        import_type,
        label_column,
        registry,
        mapping,
        ..Default::default()
    });
    session.load_file(file)?;
    Ok(session)
}
