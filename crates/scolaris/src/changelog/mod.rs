//! Append-only change log for every applied correction.
//!
//! The log is the audit trail of an import session: one entry per changed
//! cell, never reordered, never removed. The only read-time transformation
//! is a reverse-chronological view for display.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Provenance of a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    /// User typed the fix by hand.
    Manual,
    /// Bulk application of an analyzer pattern.
    AiBulk,
    /// Automatic replay from the correction memory.
    AiAuto,
}

impl ChangeType {
    /// Stable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeType::Manual => "manual",
            ChangeType::AiBulk => "ai-bulk",
            ChangeType::AiAuto => "ai-auto",
        }
    }
}

/// One applied correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// When the correction was applied.
    pub timestamp: DateTime<Utc>,
    /// How the correction came about.
    pub change_type: ChangeType,
    /// Zero-based row index in the import table.
    pub row: usize,
    /// Target column key.
    pub column: String,
    /// Value before the correction.
    pub original_value: String,
    /// Value after the correction.
    pub new_value: String,
    /// Display label of the affected record (e.g. the pupil's name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_label: Option<String>,
}

impl ChangeLogEntry {
    /// Create an entry timestamped now.
    pub fn new(
        change_type: ChangeType,
        row: usize,
        column: impl Into<String>,
        original_value: impl Into<String>,
        new_value: impl Into<String>,
        record_label: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            change_type,
            row,
            column: column.into(),
            original_value: original_value.into(),
            new_value: new_value.into(),
            record_label,
        }
    }
}

/// Summary counts over a change log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLogSummary {
    /// Total entries.
    pub total_count: usize,
    /// Entries per change-type label.
    pub count_by_type: BTreeMap<String, usize>,
    /// Entries per column.
    pub count_by_column: BTreeMap<String, usize>,
}

/// The append-only audit log of one import session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLog {
    /// Name of the imported source file.
    pub source_file: String,
    /// Import-type name (rule-registry key).
    pub import_type: String,
    entries: Vec<ChangeLogEntry>,
}

impl ChangeLog {
    /// Create an empty log for one source file and import-type.
    pub fn new(source_file: impl Into<String>, import_type: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            import_type: import_type.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry. Entries keep their insertion order forever.
    pub fn append(&mut self, entry: ChangeLogEntry) {
        self.entries.push(entry);
    }

    /// All entries in application order.
    pub fn entries(&self) -> &[ChangeLogEntry] {
        &self.entries
    }

    /// Entries newest-first, for display.
    pub fn reverse_chronological(&self) -> Vec<&ChangeLogEntry> {
        self.entries.iter().rev().collect()
    }

    /// Aggregate counts.
    pub fn summary(&self) -> ChangeLogSummary {
        let mut summary = ChangeLogSummary {
            total_count: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            *summary
                .count_by_type
                .entry(entry.change_type.label().to_string())
                .or_insert(0) += 1;
            *summary
                .count_by_column
                .entry(entry.column.clone())
                .or_insert(0) += 1;
        }
        summary
    }

    /// Serialize the log as `;`-delimited text.
    ///
    /// Line 1 carries the metadata (source file, import-type, entry count),
    /// line 2 the column headers, then one record per entry. Quoting comes
    /// from the csv writer, so fields containing the delimiter, quotes, or
    /// newlines re-split into exactly one field per column.
    pub fn export_delimited(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record([
            self.source_file.as_str(),
            self.import_type.as_str(),
            &self.entries.len().to_string(),
        ])?;
        writer.write_record([
            "Timestamp",
            "Type",
            "Row",
            "Column",
            "OriginalValue",
            "NewValue",
            "RecordLabel",
        ])?;

        for entry in &self.entries {
            writer.write_record([
                entry.timestamp.to_rfc3339().as_str(),
                entry.change_type.label(),
                &entry.row.to_string(),
                &entry.column,
                &entry.original_value,
                &entry.new_value,
                entry.record_label.as_deref().unwrap_or(""),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(change_type: ChangeType, column: &str, from: &str, to: &str) -> ChangeLogEntry {
        ChangeLogEntry::new(change_type, 0, column, from, to, Some("Muster Hans".into()))
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = ChangeLog::new("pupils.csv", "pupils");
        log.append(entry(ChangeType::Manual, "P_TEL", "a", "b"));
        log.append(entry(ChangeType::AiAuto, "P_TEL", "c", "d"));

        assert_eq!(log.entries()[0].original_value, "a");
        assert_eq!(log.entries()[1].original_value, "c");

        let newest_first = log.reverse_chronological();
        assert_eq!(newest_first[0].original_value, "c");
    }

    #[test]
    fn test_summary() {
        let mut log = ChangeLog::new("pupils.csv", "pupils");
        log.append(entry(ChangeType::Manual, "P_TEL", "a", "b"));
        log.append(entry(ChangeType::AiBulk, "P_TEL", "c", "d"));
        log.append(entry(ChangeType::AiBulk, "S_AHV", "e", "f"));

        let summary = log.summary();
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.count_by_type.get("ai-bulk"), Some(&2));
        assert_eq!(summary.count_by_column.get("P_TEL"), Some(&2));
    }

    #[test]
    fn test_export_header_lines() {
        let mut log = ChangeLog::new("pupils.csv", "pupils");
        log.append(entry(ChangeType::Manual, "P_TEL", "0041", "+41"));

        let text = log.export_delimited().unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "pupils.csv;pupils;1");
        assert_eq!(
            lines.next().unwrap(),
            "Timestamp;Type;Row;Column;OriginalValue;NewValue;RecordLabel"
        );
        let record = lines.next().unwrap();
        assert!(record.contains(";manual;0;P_TEL;0041;+41;"));
    }

    #[test]
    fn test_export_quotes_delimiter_in_fields() {
        let mut log = ChangeLog::new("pupils.csv", "pupils");
        log.append(ChangeLogEntry::new(
            ChangeType::Manual,
            2,
            "P_ADDRESS",
            "Bahnhofstrasse 1; Bern",
            "Bahnhofstrasse 1, Bern",
            None,
        ));

        let text = log.export_delimited().unwrap();
        let record_line = text.lines().nth(2).unwrap();
        assert!(record_line.contains("\"Bahnhofstrasse 1; Bern\""));

        // Re-splitting with the same dialect recovers the original fields.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[2][4], "Bahnhofstrasse 1; Bern");
        assert_eq!(&records[2][5], "Bahnhofstrasse 1, Bern");
    }
}
