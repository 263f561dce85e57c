//! Parsed table representation and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was parsed.
    pub parsed_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been parsed.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            parsed_at: Utc::now(),
        }
    }
}

/// One imported spreadsheet as rows of strings.
///
/// Rows are immutable inputs to validation; correction replay and bulk
/// fixes clone the table and return a new one rather than editing in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTable {
    /// Column headers (source or target keys, depending on mapping state).
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used in the source file.
    pub delimiter: u8,
}

impl ImportTable {
    /// Create a new table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the index of a column by header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a specific cell value by row index and column index.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Get a cell value by row index and column header.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.get(row, col)
    }

    /// Set a cell value. Used on cloned tables only; validation inputs are
    /// never written to.
    pub fn set(&mut self, row: usize, col: usize, value: String) {
        if let Some(r) = self.rows.get_mut(row) {
            if let Some(cell) = r.get_mut(col) {
                *cell = value;
            }
        }
    }

    /// Check if a value counts as empty/missing.
    pub fn is_empty_value(value: &str) -> bool {
        value.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImportTable {
        ImportTable::new(
            vec!["S_NAME".into(), "S_AHV".into()],
            vec![
                vec!["Muster".into(), "756.1234.5678.97".into()],
                vec!["".into(), "756.9999.8888.77".into()],
            ],
            b';',
        )
    }

    #[test]
    fn test_accessors() {
        let table = sample();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_index("S_AHV"), Some(1));
        assert_eq!(table.get(0, 0), Some("Muster"));
        assert_eq!(table.value(1, "S_AHV"), Some("756.9999.8888.77"));
        assert_eq!(table.value(1, "NOPE"), None);
    }

    #[test]
    fn test_set_on_clone_leaves_original_intact() {
        let table = sample();
        let mut copy = table.clone();
        copy.set(1, 0, "Beispiel".into());

        assert_eq!(copy.get(1, 0), Some("Beispiel"));
        assert_eq!(table.get(1, 0), Some(""));
    }

    #[test]
    fn test_is_empty_value() {
        assert!(ImportTable::is_empty_value(""));
        assert!(ImportTable::is_empty_value("   "));
        assert!(!ImportTable::is_empty_value("0"));
        assert!(!ImportTable::is_empty_value("x"));
    }
}
