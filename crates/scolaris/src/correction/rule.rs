//! Correction rules: exact-value and identifier-bound remembered fixes.

use serde::{Deserialize, Serialize};

use crate::input::ImportTable;

/// How a rule decides whether it applies to a row.
///
/// An identifier-bound rule is strictly narrower than an exact rule on the
/// same column/value pair: it additionally pins one record by its
/// identifier column. Lookup checks identifier-bound rules first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    /// Applies wherever the column's raw value equals the recorded original.
    Exact,
    /// Additionally requires `column == value` for the identifier column.
    IdentifierBound { column: String, value: String },
}

impl MatchMode {
    /// Whether this is the narrower, record-pinned mode.
    pub fn is_identifier_bound(&self) -> bool {
        matches!(self, MatchMode::IdentifierBound { .. })
    }
}

/// Identity of a rule, used for last-write-wins merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleIdentity {
    pub column: String,
    pub match_mode: MatchMode,
    pub original_value: String,
}

/// One remembered correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRule {
    /// Target column key the rule corrects.
    pub column: String,
    /// Exact or identifier-bound matching.
    pub match_mode: MatchMode,
    /// The raw value the rule replaces.
    pub original_value: String,
    /// The replacement.
    pub corrected_value: String,
}

impl CorrectionRule {
    /// Create an exact rule.
    pub fn exact(
        column: impl Into<String>,
        original_value: impl Into<String>,
        corrected_value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            match_mode: MatchMode::Exact,
            original_value: original_value.into(),
            corrected_value: corrected_value.into(),
        }
    }

    /// Create an identifier-bound rule.
    pub fn identifier_bound(
        column: impl Into<String>,
        original_value: impl Into<String>,
        corrected_value: impl Into<String>,
        identifier_column: impl Into<String>,
        identifier_value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            match_mode: MatchMode::IdentifierBound {
                column: identifier_column.into(),
                value: identifier_value.into(),
            },
            original_value: original_value.into(),
            corrected_value: corrected_value.into(),
        }
    }

    /// The rule's identity for dedup/merge purposes.
    pub fn identity(&self) -> RuleIdentity {
        RuleIdentity {
            column: self.column.clone(),
            match_mode: self.match_mode.clone(),
            original_value: self.original_value.clone(),
        }
    }

    /// Whether the rule applies to the given row of a table.
    pub fn matches(&self, table: &ImportTable, row: usize) -> bool {
        let Some(value) = table.value(row, &self.column) else {
            return false;
        };
        if value != self.original_value {
            return false;
        }

        match &self.match_mode {
            MatchMode::Exact => true,
            MatchMode::IdentifierBound { column, value } => {
                table.value(row, column) == Some(value.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ImportTable {
        ImportTable::new(
            vec!["S_ID".into(), "P_TEL".into()],
            vec![
                vec!["42".into(), "0041791234567".into()],
                vec!["43".into(), "0041791234567".into()],
                vec!["44".into(), "0041799999999".into()],
            ],
            b';',
        )
    }

    #[test]
    fn test_exact_matches_any_row_with_value() {
        let rule = CorrectionRule::exact("P_TEL", "0041791234567", "+41791234567");
        assert!(rule.matches(&table(), 0));
        assert!(rule.matches(&table(), 1));
        assert!(!rule.matches(&table(), 2));
    }

    #[test]
    fn test_identifier_bound_pins_one_record() {
        let rule = CorrectionRule::identifier_bound(
            "P_TEL",
            "0041791234567",
            "+41791234500",
            "S_ID",
            "42",
        );
        assert!(rule.matches(&table(), 0));
        assert!(!rule.matches(&table(), 1));
        assert!(rule.match_mode.is_identifier_bound());
    }

    #[test]
    fn test_identity_distinguishes_modes() {
        let exact = CorrectionRule::exact("P_TEL", "x", "y");
        let bound = CorrectionRule::identifier_bound("P_TEL", "x", "y", "S_ID", "42");
        assert_ne!(exact.identity(), bound.identity());
    }

    #[test]
    fn test_serde_tagged_mode() {
        let rule = CorrectionRule::identifier_bound("P_TEL", "x", "y", "S_ID", "42");
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"mode\":\"identifier_bound\""));

        let back: CorrectionRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
