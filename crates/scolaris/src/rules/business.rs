//! Business rules: cross-column invariants evaluated per row.

use serde::{Deserialize, Serialize};

use crate::input::ImportTable;

/// The predicate variants a business rule can take.
///
/// Modeled as a closed enum rather than free-form predicates so rules stay
/// serializable and every evaluation site matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusinessRuleKind {
    /// If `when_set` is non-empty, `then_required` must also be non-empty.
    RequiredTogether {
        when_set: String,
        then_required: String,
    },
    /// At most one of the two columns may be non-empty.
    MutuallyExclusive { first: String, second: String },
    /// A non-empty value in `column` must start with `prefix`.
    MatchingPrefix { column: String, prefix: String },
}

/// A cross-column invariant with its violation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRule {
    /// The predicate to evaluate against a full row.
    pub kind: BusinessRuleKind,
    /// Message emitted on failure.
    pub message: String,
}

impl BusinessRule {
    /// Create a new business rule.
    pub fn new(kind: BusinessRuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The column a violation of this rule should be reported against.
    pub fn reported_column(&self) -> &str {
        match &self.kind {
            BusinessRuleKind::RequiredTogether { then_required, .. } => then_required,
            BusinessRuleKind::MutuallyExclusive { second, .. } => second,
            BusinessRuleKind::MatchingPrefix { column, .. } => column,
        }
    }

    /// Evaluate the rule against one row. Returns `true` when the row
    /// satisfies the invariant. Columns missing from the table count as empty.
    pub fn holds(&self, table: &ImportTable, row: usize) -> bool {
        let value = |column: &str| table.value(row, column).unwrap_or("");
        let set = |column: &str| !ImportTable::is_empty_value(value(column));

        match &self.kind {
            BusinessRuleKind::RequiredTogether {
                when_set,
                then_required,
            } => !set(when_set) || set(then_required),
            BusinessRuleKind::MutuallyExclusive { first, second } => !(set(first) && set(second)),
            BusinessRuleKind::MatchingPrefix { column, prefix } => {
                !set(column) || value(column).starts_with(prefix.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], row: &[&str]) -> ImportTable {
        ImportTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            vec![row.iter().map(|s| s.to_string()).collect()],
            b';',
        )
    }

    #[test]
    fn test_required_together() {
        let rule = BusinessRule::new(
            BusinessRuleKind::RequiredTogether {
                when_set: "P_TEL".into(),
                then_required: "P_NAME".into(),
            },
            "Contact phone requires a contact name",
        );

        assert!(rule.holds(&table(&["P_TEL", "P_NAME"], &["", ""]), 0));
        assert!(rule.holds(&table(&["P_TEL", "P_NAME"], &["+41791234567", "Muster"]), 0));
        assert!(!rule.holds(&table(&["P_TEL", "P_NAME"], &["+41791234567", ""]), 0));
        assert_eq!(rule.reported_column(), "P_NAME");
    }

    #[test]
    fn test_mutually_exclusive() {
        let rule = BusinessRule::new(
            BusinessRuleKind::MutuallyExclusive {
                first: "S_EXIT_DATE".into(),
                second: "S_CLASS".into(),
            },
            "Exited pupils may not have a class assignment",
        );

        assert!(rule.holds(&table(&["S_EXIT_DATE", "S_CLASS"], &["01.08.2024", ""]), 0));
        assert!(!rule.holds(&table(&["S_EXIT_DATE", "S_CLASS"], &["01.08.2024", "3a"]), 0));
    }

    #[test]
    fn test_matching_prefix() {
        let rule = BusinessRule::new(
            BusinessRuleKind::MatchingPrefix {
                column: "S_AHV".into(),
                prefix: "756.".into(),
            },
            "AHV numbers must start with the Swiss country code 756",
        );

        assert!(rule.holds(&table(&["S_AHV"], &["756.1234.5678.97"]), 0));
        assert!(rule.holds(&table(&["S_AHV"], &[""]), 0));
        assert!(!rule.holds(&table(&["S_AHV"], &["123.4567.8901.23"]), 0));
    }

    #[test]
    fn test_missing_column_counts_as_empty() {
        let rule = BusinessRule::new(
            BusinessRuleKind::RequiredTogether {
                when_set: "NOT_THERE".into(),
                then_required: "S_NAME".into(),
            },
            "msg",
        );
        assert!(rule.holds(&table(&["S_NAME"], &[""]), 0));
    }
}
