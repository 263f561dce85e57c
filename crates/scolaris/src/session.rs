//! Import session: wires parser, worker, memory, and log for one run.

use std::path::Path;

use crate::analysis::AnalysisPattern;
use crate::analysis::PatternAnalyzer;
use crate::changelog::{ChangeLog, ChangeLogEntry, ChangeType};
use crate::correction::CorrectionMemory;
use crate::error::{ImportError, Result};
use crate::export::CleanedExport;
use crate::input::{HeaderMapping, ImportTable, Parser, ParserConfig, SourceMetadata};
use crate::rules::RuleRegistry;
use crate::validation::{ValidationSummary, Violation};
use crate::worker::{ImportWorker, WorkerRequest, WorkerResponse};

/// Configuration for one import session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Import-type name; keys the correction memory and the change log.
    pub import_type: String,
    /// Column whose value labels records in the change log (e.g. `S_NAME`).
    pub label_column: Option<String>,
    /// Resolved rule registry for this import-type.
    pub registry: RuleRegistry,
    /// Source-header → target-key mapping; applied right after parsing.
    pub mapping: Option<HeaderMapping>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            import_type: "default".to_string(),
            label_column: None,
            registry: RuleRegistry::default(),
            mapping: None,
        }
    }
}

/// One end-to-end import run: upload → map → validate → correct → export.
///
/// The session owns the table and violation list for its lifetime; the
/// correction memory outlives sessions when persisted through a store.
pub struct ImportSession {
    config: SessionConfig,
    parser: Parser,
    worker: ImportWorker,
    memory: CorrectionMemory,
    table: Option<ImportTable>,
    source: Option<SourceMetadata>,
    violations: Vec<Violation>,
    log: ChangeLog,
}

impl ImportSession {
    /// Create a session.
    pub fn new(config: SessionConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let log = ChangeLog::new("", config.import_type.clone());

        Self {
            config,
            parser,
            worker: ImportWorker::spawn(),
            memory: CorrectionMemory::new(),
            table: None,
            source: None,
            violations: Vec::new(),
            log,
        }
    }

    /// Parse a file and, when a mapping is configured, re-key it to target
    /// columns. Resets violations and the change log for the new run.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let (table, source) = self.parser.parse_file(path)?;
        let table = match &self.config.mapping {
            Some(mapping) => mapping.apply(&table)?,
            None => table,
        };

        self.log = ChangeLog::new(source.file.clone(), self.config.import_type.clone());
        self.table = Some(table);
        self.source = Some(source);
        self.violations.clear();
        Ok(())
    }

    /// Use an already-parsed table (tests, non-file collaborators).
    pub fn load_table(&mut self, table: ImportTable, source_name: &str) {
        self.log = ChangeLog::new(source_name, self.config.import_type.clone());
        self.table = Some(table);
        self.source = None;
        self.violations.clear();
    }

    /// The current table, if one is loaded.
    pub fn table(&self) -> Option<&ImportTable> {
        self.table.as_ref()
    }

    /// Source metadata of the loaded file.
    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    /// The session's correction memory.
    pub fn memory(&self) -> &CorrectionMemory {
        &self.memory
    }

    /// Mutable access to the correction memory (rule import, store load).
    pub fn memory_mut(&mut self) -> &mut CorrectionMemory {
        &mut self.memory
    }

    /// The audit log of this session.
    pub fn change_log(&self) -> &ChangeLog {
        &self.log
    }

    /// Violations from the last validation run.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    fn current_table(&self) -> Result<&ImportTable> {
        self.table
            .as_ref()
            .ok_or_else(|| ImportError::Config("No file loaded".to_string()))
    }

    /// Run validation on the worker and store the findings.
    pub fn validate(&mut self) -> Result<&[Violation]> {
        let table = self.current_table()?.clone();
        let ticket = self.worker.submit(WorkerRequest::Validate {
            table,
            registry: self.config.registry.clone(),
        })?;

        match ticket.wait()? {
            WorkerResponse::Validated(violations) => {
                self.violations = violations;
                Ok(&self.violations)
            }
            other => Err(ImportError::Delivery(format!(
                "Unexpected worker response: {other:?}"
            ))),
        }
    }

    /// Run pattern analysis on the worker against the stored findings.
    pub fn analyze(&self) -> Result<Vec<AnalysisPattern>> {
        let table = self.current_table()?.clone();
        let ticket = self.worker.submit(WorkerRequest::Analyze {
            violations: self.violations.clone(),
            table,
        })?;

        match ticket.wait()? {
            WorkerResponse::Analyzed(patterns) => Ok(patterns),
            other => Err(ImportError::Delivery(format!(
                "Unexpected worker response: {other:?}"
            ))),
        }
    }

    /// Replay the correction memory against the current table (`ai-auto`).
    ///
    /// Returns the number of applied corrections. The session's table is
    /// replaced by the corrected copy and matching violations get their
    /// `corrected_value` filled in; callers should re-validate afterwards.
    pub fn replay_memory(&mut self) -> Result<usize> {
        let table = self.current_table()?.clone();
        let ticket = self.worker.submit(WorkerRequest::ApplyRules {
            table,
            rules: self.memory.rules().to_vec(),
            provenance: ChangeType::AiAuto,
            label_column: self.config.label_column.clone(),
            source_file: self.log.source_file.clone(),
            import_type: self.config.import_type.clone(),
        })?;

        match ticket.wait()? {
            WorkerResponse::Applied {
                table,
                applied,
                log,
            } => {
                for entry in log.entries() {
                    self.mark_corrected(entry.row, &entry.column, &entry.new_value);
                    self.log.append(entry.clone());
                }
                self.table = Some(table);
                Ok(applied)
            }
            other => Err(ImportError::Delivery(format!(
                "Unexpected worker response: {other:?}"
            ))),
        }
    }

    /// Apply one manual correction to a cell.
    ///
    /// Logs a `manual` entry, annotates the matching violation, and, when
    /// `remember` is set, records a rule in the correction memory
    /// (identifier-bound when an identifier pair is given).
    pub fn accept_correction(
        &mut self,
        row: usize,
        column: &str,
        corrected: &str,
        remember: bool,
        identifier: Option<(&str, &str)>,
    ) -> Result<()> {
        let table = self.current_table()?;
        let col = table
            .column_index(column)
            .ok_or_else(|| ImportError::UnknownColumn(column.to_string()))?;
        let original = table
            .get(row, col)
            .ok_or_else(|| ImportError::Config(format!("Row {row} out of range")))?
            .to_string();

        let record_label = self
            .config
            .label_column
            .as_deref()
            .and_then(|c| table.value(row, c))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let mut updated = table.clone();
        updated.set(row, col, corrected.to_string());
        self.table = Some(updated);

        self.log.append(ChangeLogEntry::new(
            ChangeType::Manual,
            row,
            column,
            &original,
            corrected,
            record_label,
        ));
        self.mark_corrected(row, column, corrected);

        if remember {
            self.memory.add(CorrectionMemory::rule_from_correction(
                column, &original, corrected, identifier,
            ));
        }
        Ok(())
    }

    /// Bulk-apply an auto-fixable pattern (`ai-bulk`).
    pub fn apply_pattern(&mut self, pattern: &AnalysisPattern) -> Result<usize> {
        let table = self.current_table()?.clone();
        let (updated, applied) = PatternAnalyzer::new().apply_fix(
            &table,
            pattern,
            self.config.label_column.as_deref(),
            &mut self.log,
        )?;

        let start = self.log.entries().len() - applied;
        let corrected: Vec<(usize, String, String)> = self.log.entries()[start..]
            .iter()
            .map(|e| (e.row, e.column.clone(), e.new_value.clone()))
            .collect();
        for (row, column, value) in corrected {
            self.mark_corrected(row, &column, &value);
        }

        self.table = Some(updated);
        Ok(applied)
    }

    /// Summary of the last validation run.
    pub fn validation_summary(&self) -> ValidationSummary {
        let total_rows = self.table.as_ref().map(|t| t.row_count()).unwrap_or(0);
        ValidationSummary::from_violations(total_rows, &self.violations)
    }

    /// Export the current table as delimited text.
    pub fn export_cleaned(&self, error_free_only: bool) -> Result<String> {
        let table = self.current_table()?;
        CleanedExport::new()
            .error_free_only(error_free_only)
            .delimiter(table.delimiter)
            .to_string(table, &self.violations)
    }

    /// Export the audit log as delimited text.
    pub fn export_changelog(&self) -> Result<String> {
        self.log.export_delimited()
    }

    fn mark_corrected(&mut self, row: usize, column: &str, corrected: &str) {
        for v in &mut self.violations {
            if v.row == row && v.column == column && v.corrected_value.is_none() {
                v.corrected_value = Some(corrected.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ColumnDefinition, ExpectedType, FormatRule};

    fn config() -> SessionConfig {
        SessionConfig {
            import_type: "pupils".to_string(),
            label_column: Some("S_NAME".to_string()),
            registry: RuleRegistry {
                columns: vec![
                    ColumnDefinition::new("S_NAME", ExpectedType::Text).required(),
                    ColumnDefinition::new("P_TEL", ExpectedType::Phone),
                ],
                format_rules: vec![FormatRule::new(
                    "P_TEL",
                    r"^\+41\d{9}$",
                    "Phone must use +41 format",
                )],
                business_rules: Vec::new(),
            },
            ..Default::default()
        }
    }

    fn table() -> ImportTable {
        ImportTable::new(
            vec!["S_NAME".into(), "P_TEL".into()],
            vec![
                vec!["Muster".into(), "0041791234567".into()],
                vec!["Beispiel".into(), "+41791112233".into()],
            ],
            b';',
        )
    }

    #[test]
    fn test_validate_and_summary() {
        let mut session = ImportSession::new(config());
        session.load_table(table(), "pupils.csv");

        let violations = session.validate().unwrap();
        assert_eq!(violations.len(), 1);

        let summary = session.validation_summary();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.rows_with_violations, 1);
    }

    #[test]
    fn test_manual_correction_remembers_rule() {
        let mut session = ImportSession::new(config());
        session.load_table(table(), "pupils.csv");
        session.validate().unwrap();

        session
            .accept_correction(0, "P_TEL", "+41791234567", true, None)
            .unwrap();

        assert_eq!(session.table().unwrap().value(0, "P_TEL"), Some("+41791234567"));
        assert_eq!(session.memory().len(), 1);
        assert_eq!(session.change_log().entries().len(), 1);
        assert_eq!(
            session.change_log().entries()[0].record_label.as_deref(),
            Some("Muster")
        );
        assert_eq!(
            session.violations()[0].corrected_value.as_deref(),
            Some("+41791234567")
        );
    }

    #[test]
    fn test_validate_without_file_is_config_error() {
        let mut session = ImportSession::new(config());
        assert!(matches!(
            session.validate(),
            Err(ImportError::Config(_))
        ));
    }
}
