//! The keyed store of approved corrections and its replay logic.

use serde::{Deserialize, Serialize};

use super::rule::{CorrectionRule, MatchMode};
use super::store::KeyValueStore;
use crate::changelog::{ChangeLog, ChangeLogEntry, ChangeType};
use crate::error::{ImportError, Result};
use crate::input::ImportTable;

/// Result of a best-effort persistence pass.
///
/// One failed write must not block the others, so failures are collected
/// per rule instead of aborting the save.
#[derive(Debug, Default)]
pub struct SaveOutcome {
    /// Number of rules written.
    pub saved: usize,
    /// Index and error for every rule that failed to write.
    pub failed: Vec<(usize, ImportError)>,
}

impl SaveOutcome {
    /// Whether every rule was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The set of approved correction rules for one import-type.
///
/// Owned for the lifetime of a session; optionally persisted across
/// sessions through a [`KeyValueStore`] or exported as a portable JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionMemory {
    rules: Vec<CorrectionRule>,
}

impl CorrectionMemory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory from existing rules, merging duplicates
    /// last-write-wins.
    pub fn from_rules(rules: Vec<CorrectionRule>) -> Self {
        let mut memory = Self::new();
        for rule in rules {
            memory.add(rule);
        }
        memory
    }

    /// The current rules.
    pub fn rules(&self) -> &[CorrectionRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the memory holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build a rule from an accepted correction. Pure constructor: an
    /// identifier column/value pair makes it identifier-bound, otherwise
    /// the rule matches by exact value.
    pub fn rule_from_correction(
        column: &str,
        original_value: &str,
        corrected_value: &str,
        identifier: Option<(&str, &str)>,
    ) -> CorrectionRule {
        match identifier {
            Some((id_column, id_value)) => CorrectionRule::identifier_bound(
                column,
                original_value,
                corrected_value,
                id_column,
                id_value,
            ),
            None => CorrectionRule::exact(column, original_value, corrected_value),
        }
    }

    /// Add a rule. A rule with the same identity replaces the existing one
    /// (last-write-wins); otherwise it is appended.
    pub fn add(&mut self, rule: CorrectionRule) {
        let identity = rule.identity();
        match self.rules.iter_mut().find(|r| r.identity() == identity) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Find the rule to apply for one row/column pair.
    ///
    /// Identifier-bound rules take precedence over exact rules: a value can
    /// be globally wrong for most records yet intentionally different for
    /// one identified record.
    pub fn find_applicable_rule(
        &self,
        table: &ImportTable,
        row: usize,
        column: &str,
    ) -> Option<&CorrectionRule> {
        let candidates = || {
            self.rules
                .iter()
                .filter(|r| r.column == column && r.matches(table, row))
        };

        candidates()
            .find(|r| r.match_mode.is_identifier_bound())
            .or_else(|| candidates().find(|r| r.match_mode == MatchMode::Exact))
    }

    /// Replay the memory against a table.
    ///
    /// Returns a new table with matched cells replaced and the number of
    /// applied corrections; the input is never mutated. Each replacement is
    /// appended to the change log with the caller-supplied provenance
    /// (`ai-auto` for automatic replay on import).
    pub fn apply(
        &self,
        table: &ImportTable,
        provenance: ChangeType,
        label_column: Option<&str>,
        log: &mut ChangeLog,
    ) -> (ImportTable, usize) {
        let mut result = table.clone();
        let mut applied = 0;

        for row in 0..table.row_count() {
            for (col, header) in table.headers.iter().enumerate() {
                let Some(rule) = self.find_applicable_rule(table, row, header) else {
                    continue;
                };
                if rule.corrected_value == rule.original_value {
                    continue;
                }

                let record_label = label_column
                    .and_then(|c| table.value(row, c))
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string());

                log.append(ChangeLogEntry::new(
                    provenance,
                    row,
                    header,
                    &rule.original_value,
                    &rule.corrected_value,
                    record_label,
                ));
                result.set(row, col, rule.corrected_value.clone());
                applied += 1;
            }
        }

        (result, applied)
    }

    /// Serialize the rule set as a portable JSON file.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rules)?)
    }

    /// Merge rules from an exported JSON file into this memory.
    ///
    /// Rules are appended; a rule whose identity matches an existing one
    /// replaces it (last-write-wins). Returns the number of rules read.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let rules: Vec<CorrectionRule> = serde_json::from_str(json)?;
        let count = rules.len();
        for rule in rules {
            self.add(rule);
        }
        Ok(count)
    }

    /// Persist the rules to a store under the given import-type, one entry
    /// per rule, best-effort.
    pub fn save_to_store(&self, store: &mut dyn KeyValueStore, import_type: &str) -> SaveOutcome {
        let prefix = rules_prefix(import_type);

        // Drop stale entries so removed rules do not resurrect on load.
        for key in store.keys_with_prefix(&prefix) {
            let _ = store.remove(&key);
        }

        let mut outcome = SaveOutcome::default();
        for (index, rule) in self.rules.iter().enumerate() {
            let write = serde_json::to_string(rule)
                .map_err(ImportError::from)
                .and_then(|json| store.set(&format!("{prefix}{index:06}"), &json));
            match write {
                Ok(()) => outcome.saved += 1,
                Err(e) => outcome.failed.push((index, e)),
            }
        }
        outcome
    }

    /// Load the rules stored under an import-type. Entries that fail to
    /// parse are skipped rather than failing the whole load.
    pub fn load_from_store(store: &dyn KeyValueStore, import_type: &str) -> Self {
        let prefix = rules_prefix(import_type);
        let rules = store
            .keys_with_prefix(&prefix)
            .into_iter()
            .filter_map(|key| store.get(&key))
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect();
        Self::from_rules(rules)
    }

    /// Delete every stored rule for an import-type.
    ///
    /// Destructive and non-reversible; refuses to run unless the caller
    /// passes explicit confirmation. Returns the number of removed entries.
    pub fn clear_saved(
        store: &mut dyn KeyValueStore,
        import_type: &str,
        confirmed: bool,
    ) -> Result<usize> {
        if !confirmed {
            return Err(ImportError::Config(
                "Clearing stored correction rules requires explicit confirmation".to_string(),
            ));
        }

        let keys = store.keys_with_prefix(&rules_prefix(import_type));
        let mut removed = 0;
        for key in keys {
            store.remove(&key)?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn rules_prefix(import_type: &str) -> String {
    format!("rules/{import_type}/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::MemoryStore;

    fn table() -> ImportTable {
        ImportTable::new(
            vec!["S_ID".into(), "S_NAME".into(), "P_TEL".into()],
            vec![
                vec!["42".into(), "Muster".into(), "0041791234567".into()],
                vec!["43".into(), "Beispiel".into(), "0041791234567".into()],
                vec!["44".into(), "Weber".into(), "0041799999999".into()],
            ],
            b';',
        )
    }

    #[test]
    fn test_rule_from_correction_modes() {
        let exact = CorrectionMemory::rule_from_correction("P_TEL", "a", "b", None);
        assert_eq!(exact.match_mode, MatchMode::Exact);

        let bound =
            CorrectionMemory::rule_from_correction("P_TEL", "a", "b", Some(("S_ID", "42")));
        assert!(bound.match_mode.is_identifier_bound());
    }

    #[test]
    fn test_identifier_bound_takes_precedence() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "0041791234567", "+41791234567"));
        memory.add(CorrectionRule::identifier_bound(
            "P_TEL",
            "0041791234567",
            "+41795550000",
            "S_ID",
            "42",
        ));

        let t = table();
        let for_42 = memory.find_applicable_rule(&t, 0, "P_TEL").unwrap();
        assert_eq!(for_42.corrected_value, "+41795550000");

        let for_43 = memory.find_applicable_rule(&t, 1, "P_TEL").unwrap();
        assert_eq!(for_43.corrected_value, "+41791234567");

        assert!(memory.find_applicable_rule(&t, 2, "P_TEL").is_none());
    }

    #[test]
    fn test_apply_is_non_mutating_and_logged() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "0041791234567", "+41791234567"));

        let t = table();
        let mut log = ChangeLog::new("pupils.csv", "pupils");
        let (fixed, applied) = memory.apply(&t, ChangeType::AiAuto, Some("S_NAME"), &mut log);

        assert_eq!(applied, 2);
        assert_eq!(fixed.value(0, "P_TEL"), Some("+41791234567"));
        assert_eq!(fixed.value(1, "P_TEL"), Some("+41791234567"));
        // Different value in row 2 stays untouched.
        assert_eq!(fixed.value(2, "P_TEL"), Some("0041799999999"));
        // Input table unchanged.
        assert_eq!(t.value(0, "P_TEL"), Some("0041791234567"));

        assert_eq!(log.entries().len(), 2);
        assert!(log.entries().iter().all(|e| e.change_type == ChangeType::AiAuto));
        assert_eq!(log.entries()[0].record_label.as_deref(), Some("Muster"));
    }

    #[test]
    fn test_import_json_last_write_wins() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "0041791234567", "+41791234567"));

        let imported = vec![
            CorrectionRule::exact("P_TEL", "0041791234567", "+41790000000"),
            CorrectionRule::exact("S_NAME", "Mstr", "Muster"),
        ];
        let json = serde_json::to_string(&imported).unwrap();
        let count = memory.import_json(&json).unwrap();

        assert_eq!(count, 2);
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.rules()[0].corrected_value, "+41790000000");
    }

    #[test]
    fn test_store_round_trip() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "a", "b"));
        memory.add(CorrectionRule::identifier_bound("P_TEL", "a", "c", "S_ID", "42"));

        let mut store = MemoryStore::new();
        let outcome = memory.save_to_store(&mut store, "pupils");
        assert!(outcome.is_complete());
        assert_eq!(outcome.saved, 2);

        let loaded = CorrectionMemory::load_from_store(&store, "pupils");
        assert_eq!(loaded.rules(), memory.rules());

        // Other import-types are isolated.
        let other = CorrectionMemory::load_from_store(&store, "teachers");
        assert!(other.is_empty());
    }

    /// Store double that refuses writes to one key.
    struct FlakyStore {
        inner: MemoryStore,
        refuse_suffix: String,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key.ends_with(&self.refuse_suffix) {
                return Err(ImportError::Persistence(format!(
                    "write refused for '{key}'"
                )));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
            self.inner.keys_with_prefix(prefix)
        }
    }

    #[test]
    fn test_save_keeps_going_past_failed_writes() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "a", "b"));
        memory.add(CorrectionRule::exact("S_NAME", "Mstr", "Muster"));
        memory.add(CorrectionRule::exact("S_AHV", "756", "756.1234.5678.97"));

        let mut store = FlakyStore {
            inner: MemoryStore::new(),
            refuse_suffix: "000001".to_string(),
        };
        let outcome = memory.save_to_store(&mut store, "pupils");

        assert!(!outcome.is_complete());
        assert_eq!(outcome.saved, 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, 1);
        assert!(matches!(outcome.failed[0].1, ImportError::Persistence(_)));

        // The writes around the failed one landed.
        let loaded = CorrectionMemory::load_from_store(&store, "pupils");
        assert_eq!(loaded.len(), 2);
        assert!(loaded.rules().iter().all(|r| r.column != "S_NAME"));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut memory = CorrectionMemory::new();
        memory.add(CorrectionRule::exact("P_TEL", "a", "b"));

        let mut store = MemoryStore::new();
        memory.save_to_store(&mut store, "pupils");

        let err = CorrectionMemory::clear_saved(&mut store, "pupils", false).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
        assert_eq!(store.keys_with_prefix("rules/pupils/").len(), 1);

        let removed = CorrectionMemory::clear_saved(&mut store, "pupils", true).unwrap();
        assert_eq!(removed, 1);
        assert!(store.keys_with_prefix("rules/pupils/").is_empty());
    }
}
