//! Groups validation findings into bulk-fixable patterns.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::pattern::{AnalysisPattern, FixAction};
use crate::changelog::{ChangeLog, ChangeLogEntry, ChangeType};
use crate::error::{ImportError, Result};
use crate::input::ImportTable;
use crate::validation::{Violation, ViolationKind};

/// Minimum findings per `(column, kind)` group before it counts as a
/// systematic pattern rather than scattered one-off mistakes.
pub const MIN_GROUP_SIZE: usize = 3;

static DATE_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}/\d{1,2}/\d{1,4}$").unwrap());
static DATE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}-\d{1,2}-\d{1,4}$").unwrap());

/// Scans validation findings for recurring, auto-fixable mistakes.
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Derive patterns from one validation run.
    ///
    /// Findings are grouped by `(column, kind)`; groups below
    /// [`MIN_GROUP_SIZE`] are dropped. A group is auto-fixable only when one
    /// candidate transformation changes every affected value; a single
    /// non-conforming member makes the whole group manual-only.
    ///
    /// Traversal is over a sorted map and a fixed candidate order, so the
    /// same inputs always produce the same patterns.
    pub fn analyze(&self, violations: &[Violation], table: &ImportTable) -> Vec<AnalysisPattern> {
        let mut groups: BTreeMap<(String, ViolationKind), Vec<usize>> = BTreeMap::new();
        for v in violations {
            groups
                .entry((v.column.clone(), v.kind))
                .or_default()
                .push(v.row);
        }

        let mut patterns = Vec::new();
        for ((column, kind), mut rows) in groups {
            rows.sort_unstable();
            rows.dedup();
            if rows.len() < MIN_GROUP_SIZE {
                continue;
            }

            let values: Vec<String> = rows
                .iter()
                .map(|&row| table.value(row, &column).unwrap_or("").to_string())
                .collect();

            let suggested_fix = match kind {
                // Nothing can be derived from an empty cell.
                ViolationKind::MissingRequired => None,
                _ => derive_total_fix(&values),
            };
            let can_auto_fix = suggested_fix.is_some();

            let description = match &suggested_fix {
                Some(fix) => format!(
                    "{} values in '{}' share the same malformation; fix: {}",
                    rows.len(),
                    column,
                    fix.describe()
                ),
                None => format!(
                    "{} values in '{}' violate '{}' but no single safe fix applies",
                    rows.len(),
                    column,
                    kind.label()
                ),
            };

            patterns.push(AnalysisPattern {
                kind,
                column,
                affected_rows: rows,
                description,
                can_auto_fix,
                suggested_fix,
            });
        }

        patterns
    }

    /// Bulk-apply a pattern's fix to a table.
    ///
    /// Returns a new table; the input is untouched. Every changed cell is
    /// appended to the change log as `ai-bulk`, labeled with the row's value
    /// in `label_column` when given.
    pub fn apply_fix(
        &self,
        table: &ImportTable,
        pattern: &AnalysisPattern,
        label_column: Option<&str>,
        log: &mut ChangeLog,
    ) -> Result<(ImportTable, usize)> {
        let fix = pattern.suggested_fix.as_ref().ok_or_else(|| {
            ImportError::Config(format!(
                "Pattern on '{}' is not auto-fixable",
                pattern.column
            ))
        })?;
        let col = table
            .column_index(&pattern.column)
            .ok_or_else(|| ImportError::UnknownColumn(pattern.column.clone()))?;

        let mut result = table.clone();
        let mut applied = 0;

        for &row in &pattern.affected_rows {
            let Some(original) = table.get(row, col) else {
                continue;
            };
            let fixed = fix.apply(original);
            if fixed == original {
                continue;
            }

            let record_label = label_column
                .and_then(|c| table.value(row, c))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());

            log.append(ChangeLogEntry::new(
                ChangeType::AiBulk,
                row,
                &pattern.column,
                original,
                &fixed,
                record_label,
            ));
            result.set(row, col, fixed);
            applied += 1;
        }

        Ok((result, applied))
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a transformation that changes every one of the offending values.
///
/// Candidates are tried in a fixed order; the first total one wins. `None`
/// means the malformation is ambiguous and must stay a manual correction.
fn derive_total_fix(values: &[String]) -> Option<FixAction> {
    if values.is_empty() {
        return None;
    }

    let candidates = [
        FixAction::ReplacePrefix {
            from: "00".into(),
            to: "+".into(),
        },
        FixAction::ReplaceSeparator { from: '/', to: '.' },
        FixAction::ReplaceSeparator { from: '-', to: '.' },
        FixAction::StripChars { chars: " ".into() },
        FixAction::StripChars { chars: "'".into() },
    ];

    candidates
        .into_iter()
        .filter(|fix| plausible(fix, values))
        .find(|fix| is_total(fix, values))
}

/// Cheap structural precondition per candidate, checked before the full
/// totality scan.
fn plausible(fix: &FixAction, values: &[String]) -> bool {
    match fix {
        FixAction::ReplacePrefix { from, .. } => values.iter().all(|v| v.starts_with(from.as_str())),
        FixAction::ReplaceSeparator { from: '/', .. } => {
            values.iter().all(|v| DATE_SLASH.is_match(v))
        }
        FixAction::ReplaceSeparator { from: '-', .. } => values.iter().all(|v| DATE_DASH.is_match(v)),
        FixAction::ReplaceSeparator { from, .. } => values.iter().all(|v| v.contains(*from)),
        FixAction::StripChars { chars } => values
            .iter()
            .all(|v| v.chars().any(|c| chars.contains(c))),
    }
}

/// A fix is total when it changes every value and empties none.
fn is_total(fix: &FixAction, values: &[String]) -> bool {
    values.iter().all(|v| {
        let fixed = fix.apply(v);
        fixed != *v && !fixed.is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_violations(values: &[&str]) -> (Vec<Violation>, ImportTable) {
        let table = ImportTable::new(
            vec!["S_NAME".into(), "P_TEL".into()],
            values
                .iter()
                .enumerate()
                .map(|(i, v)| vec![format!("Pupil{i}"), v.to_string()])
                .collect(),
            b';',
        );
        let violations = values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                Violation::new(
                    row,
                    "P_TEL",
                    *v,
                    ViolationKind::FormatViolation,
                    "Phone must use +41 format",
                )
            })
            .collect();
        (violations, table)
    }

    #[test]
    fn test_missing_prefix_pattern() {
        let (violations, table) =
            phone_violations(&["0041791111111", "0041792222222", "0041793333333"]);
        let patterns = PatternAnalyzer::new().analyze(&violations, &table);

        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.column, "P_TEL");
        assert_eq!(p.occurrences(), 3);
        assert!(p.can_auto_fix);
        assert_eq!(
            p.suggested_fix,
            Some(FixAction::ReplacePrefix {
                from: "00".into(),
                to: "+".into()
            })
        );
    }

    #[test]
    fn test_conservative_on_one_outlier() {
        // Third value does not share the missing-prefix shape: the whole
        // group must stay manual.
        let (violations, table) =
            phone_violations(&["0041791111111", "0041792222222", "79-333-3333"]);
        let patterns = PatternAnalyzer::new().analyze(&violations, &table);

        assert_eq!(patterns.len(), 1);
        assert!(!patterns[0].can_auto_fix);
        assert!(patterns[0].suggested_fix.is_none());
    }

    #[test]
    fn test_below_threshold_is_no_pattern() {
        let (violations, table) = phone_violations(&["0041791111111", "0041792222222"]);
        let patterns = PatternAnalyzer::new().analyze(&violations, &table);
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_missing_required_never_auto_fixes() {
        let table = ImportTable::new(
            vec!["S_NAME".into()],
            vec![vec!["".into()], vec!["".into()], vec!["".into()]],
            b';',
        );
        let violations: Vec<Violation> = (0..3)
            .map(|row| {
                Violation::new(
                    row,
                    "S_NAME",
                    "",
                    ViolationKind::MissingRequired,
                    "missing-required",
                )
            })
            .collect();

        let patterns = PatternAnalyzer::new().analyze(&violations, &table);
        assert_eq!(patterns.len(), 1);
        assert!(!patterns[0].can_auto_fix);
    }

    #[test]
    fn test_date_separator_pattern() {
        let table = ImportTable::new(
            vec!["S_BIRTHDATE".into()],
            vec![
                vec!["01/08/2014".into()],
                vec!["17/03/2015".into()],
                vec!["30/11/2013".into()],
            ],
            b';',
        );
        let violations: Vec<Violation> = (0..3)
            .map(|row| {
                Violation::new(
                    row,
                    "S_BIRTHDATE",
                    table.get(row, 0).unwrap(),
                    ViolationKind::FormatViolation,
                    "Date must use dd.mm.yyyy",
                )
            })
            .collect();

        let patterns = PatternAnalyzer::new().analyze(&violations, &table);
        assert_eq!(
            patterns[0].suggested_fix,
            Some(FixAction::ReplaceSeparator { from: '/', to: '.' })
        );
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let (violations, table) =
            phone_violations(&["0041791111111", "0041792222222", "0041793333333"]);
        let analyzer = PatternAnalyzer::new();
        assert_eq!(
            analyzer.analyze(&violations, &table),
            analyzer.analyze(&violations, &table)
        );
    }

    #[test]
    fn test_apply_fix_bulk() {
        let (violations, table) =
            phone_violations(&["0041791111111", "0041792222222", "0041793333333"]);
        let analyzer = PatternAnalyzer::new();
        let patterns = analyzer.analyze(&violations, &table);

        let mut log = ChangeLog::new("pupils.csv", "pupils");
        let (fixed, applied) = analyzer
            .apply_fix(&table, &patterns[0], Some("S_NAME"), &mut log)
            .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(fixed.value(0, "P_TEL"), Some("+41791111111"));
        // Input untouched.
        assert_eq!(table.value(0, "P_TEL"), Some("0041791111111"));
        assert_eq!(log.entries().len(), 3);
        assert!(log
            .entries()
            .iter()
            .all(|e| e.change_type == ChangeType::AiBulk));
        assert_eq!(log.entries()[0].record_label.as_deref(), Some("Pupil0"));
    }
}
