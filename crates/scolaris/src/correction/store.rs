//! Injected key→string storage for rules and wizard flags.
//!
//! The host environment decides where the data actually lives (browser
//! local storage in the original wizard, a JSON file here); the core only
//! talks to the [`KeyValueStore`] trait so everything stays testable
//! without a real backend.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Minimal key→string storage interface.
pub trait KeyValueStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
    /// All stored keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-memory store for tests and single-session use.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

/// Durable store backed by one JSON file.
///
/// The whole map is rewritten on each mutation; individual writes stay
/// independent, so one failed `set` leaves earlier entries saved.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ImportError::Persistence(format!("Failed to read '{}': {}", path.display(), e))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                ImportError::Persistence(format!("Failed to parse '{}': {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ImportError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).map_err(|e| {
            ImportError::Persistence(format!("Failed to write '{}': {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

// Wizard flags: simple key→string entries next to the rules, no schema
// versioning.

fn help_dismissed_key(step: u8) -> String {
    format!("help/dismissed/{step}")
}

const COOKIE_CONSENT_KEY: &str = "consent/cookies";

/// Whether the help overlay for a wizard step was dismissed.
pub fn is_help_dismissed(store: &dyn KeyValueStore, step: u8) -> bool {
    store.get(&help_dismissed_key(step)).as_deref() == Some("true")
}

/// Mark the help overlay for a wizard step as dismissed.
pub fn set_help_dismissed(store: &mut dyn KeyValueStore, step: u8) -> Result<()> {
    store.set(&help_dismissed_key(step), "true")
}

/// Stored cookie-consent status, if any.
pub fn cookie_consent(store: &dyn KeyValueStore) -> Option<String> {
    store.get(COOKIE_CONSENT_KEY)
}

/// Record the cookie-consent status.
pub fn set_cookie_consent(store: &mut dyn KeyValueStore, status: &str) -> Result<()> {
    store.set(COOKIE_CONSENT_KEY, status)
}
