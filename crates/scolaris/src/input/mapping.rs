//! Header mapping from source columns to target column keys.
//!
//! The legacy export names its columns after the source system
//! (`Name`, `Vorname`, `AHV-Nr.`); the rule registry works with stable
//! target keys (`S_NAME`, `S_VORNAME`, `S_AHV`). The mapping table bridges
//! the two and is supplied per import-type by the admin configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::source::ImportTable;
use crate::error::{ImportError, Result};

/// Ordered source-header to target-key mapping.
///
/// Insertion order determines the column order of the mapped table, so the
/// export reproduces the order the admin configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Source header → target column key.
    pub entries: IndexMap<String, String>,
}

impl HeaderMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source → target pair.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(source.into(), target.into());
    }

    /// Look up the target key for a source header.
    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(|s| s.as_str())
    }

    /// Target column keys in mapping order.
    pub fn target_headers(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }

    /// Re-key a table from source headers to target keys.
    ///
    /// Unmapped source columns are dropped; a mapped column missing from the
    /// table is an error, since the rule registry would silently never see it.
    pub fn apply(&self, table: &ImportTable) -> Result<ImportTable> {
        if self.entries.is_empty() {
            return Err(ImportError::Config("Header mapping is empty".to_string()));
        }

        let mut indices = Vec::with_capacity(self.entries.len());
        for source in self.entries.keys() {
            let idx = table
                .column_index(source)
                .ok_or_else(|| ImportError::UnknownColumn(source.clone()))?;
            indices.push(idx);
        }

        let headers = self.target_headers();
        let rows = table
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(ImportTable::new(headers, rows, table.delimiter))
    }
}

impl FromIterator<(String, String)> for HeaderMapping {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
