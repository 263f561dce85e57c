//! Analysis patterns and the pure fix transformations behind them.

use serde::{Deserialize, Serialize};

use crate::validation::ViolationKind;

/// A deterministic, total transformation of a cell value.
///
/// Every variant is a pure function of the original value. The analyzer
/// only attaches an action to a pattern after proving it changes every
/// affected value, so bulk application can never half-fix a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixAction {
    /// Replace a leading prefix (e.g. `00` → `+` for phone numbers).
    ReplacePrefix { from: String, to: String },
    /// Remove every occurrence of the listed characters.
    StripChars { chars: String },
    /// Replace one separator character with another (e.g. `/` → `.` in dates).
    ReplaceSeparator { from: char, to: char },
}

impl FixAction {
    /// Apply the transformation to one value.
    pub fn apply(&self, value: &str) -> String {
        match self {
            FixAction::ReplacePrefix { from, to } => match value.strip_prefix(from.as_str()) {
                Some(rest) => format!("{to}{rest}"),
                None => value.to_string(),
            },
            FixAction::StripChars { chars } => {
                value.chars().filter(|c| !chars.contains(*c)).collect()
            }
            FixAction::ReplaceSeparator { from, to } => {
                value.chars().map(|c| if c == *from { *to } else { c }).collect()
            }
        }
    }

    /// Short description of the transformation for display.
    pub fn describe(&self) -> String {
        match self {
            FixAction::ReplacePrefix { from, to } => {
                format!("replace leading '{from}' with '{to}'")
            }
            FixAction::StripChars { chars } => format!("remove characters '{chars}'"),
            FixAction::ReplaceSeparator { from, to } => {
                format!("replace separator '{from}' with '{to}'")
            }
        }
    }
}

/// A recurring malformation detected across rows of one column.
///
/// Derived data: recomputing from the same violations and rows always
/// yields the same patterns. Patterns are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPattern {
    /// The violation kind the grouped findings share.
    pub kind: ViolationKind,
    /// Affected column key.
    pub column: String,
    /// Row indices of every finding in the group, ascending.
    pub affected_rows: Vec<usize>,
    /// Human-readable description of the detected malformation.
    pub description: String,
    /// Whether one total transformation fixes every affected row.
    pub can_auto_fix: bool,
    /// The transformation, present only when `can_auto_fix` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<FixAction>,
}

impl AnalysisPattern {
    /// Number of affected rows.
    pub fn occurrences(&self) -> usize {
        self.affected_rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_prefix() {
        let fix = FixAction::ReplacePrefix {
            from: "00".into(),
            to: "+".into(),
        };
        assert_eq!(fix.apply("0041791234567"), "+41791234567");
        assert_eq!(fix.apply("+41791234567"), "+41791234567");
    }

    #[test]
    fn test_strip_chars() {
        let fix = FixAction::StripChars { chars: " ".into() };
        assert_eq!(fix.apply("+41 79 123 45 67"), "+41791234567");
    }

    #[test]
    fn test_replace_separator() {
        let fix = FixAction::ReplaceSeparator { from: '/', to: '.' };
        assert_eq!(fix.apply("01/08/2024"), "01.08.2024");
    }

    #[test]
    fn test_apply_is_pure() {
        let fix = FixAction::ReplacePrefix {
            from: "00".into(),
            to: "+".into(),
        };
        let value = "0041791234567";
        assert_eq!(fix.apply(value), fix.apply(value));
    }
}
