//! Cleaned-data export.
//!
//! Writes the corrected table back out as delimited text. Header
//! substitution happens upstream via [`HeaderMapping::apply`]; by the time
//! a table reaches the exporter it is already keyed by target columns.
//!
//! [`HeaderMapping::apply`]: crate::input::HeaderMapping::apply

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::input::ImportTable;
use crate::validation::Violation;

/// Configurable exporter for cleaned tables.
#[derive(Debug, Clone)]
pub struct CleanedExport {
    error_free_only: bool,
    delimiter: u8,
}

impl CleanedExport {
    /// Create an exporter with semicolon delimiter and all rows included.
    pub fn new() -> Self {
        Self {
            error_free_only: false,
            delimiter: b';',
        }
    }

    /// Only export rows without any remaining violation.
    pub fn error_free_only(mut self, enabled: bool) -> Self {
        self.error_free_only = enabled;
        self
    }

    /// Set the output delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Render the table as delimited text.
    pub fn to_string(&self, table: &ImportTable, violations: &[Violation]) -> Result<String> {
        let bytes = self.write_bytes(table, violations)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write the table to a file.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        table: &ImportTable,
        violations: &[Violation],
    ) -> Result<usize> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let excluded = self.excluded_rows(violations);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(file);
        self.write_records(&mut writer, table, &excluded)?;
        writer.flush().map_err(|e| ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(table.row_count() - excluded.len().min(table.row_count()))
    }

    fn write_bytes(&self, table: &ImportTable, violations: &[Violation]) -> Result<Vec<u8>> {
        let excluded = self.excluded_rows(violations);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        self.write_records(&mut writer, table, &excluded)?;
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())).into())
    }

    fn excluded_rows(&self, violations: &[Violation]) -> BTreeSet<usize> {
        if self.error_free_only {
            violations.iter().map(|v| v.row).collect()
        } else {
            BTreeSet::new()
        }
    }

    fn write_records<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        table: &ImportTable,
        excluded: &BTreeSet<usize>,
    ) -> Result<()> {
        writer.write_record(&table.headers)?;
        for (row_idx, row) in table.rows.iter().enumerate() {
            if excluded.contains(&row_idx) {
                continue;
            }
            writer.write_record(row)?;
        }
        Ok(())
    }
}

impl Default for CleanedExport {
    fn default() -> Self {
        Self::new()
    }
}
