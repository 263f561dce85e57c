//! Format rules: per-column patterns with an error message.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Declares an acceptable shape for a column's values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRule {
    /// Target column key this rule applies to.
    pub column: String,
    /// Regex the full value must match.
    pub pattern: String,
    /// Message emitted on mismatch.
    pub message: String,
}

impl FormatRule {
    /// Create a new format rule.
    pub fn new(
        column: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// A format rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledFormatRule {
    /// The source rule.
    pub rule: FormatRule,
    regex: Regex,
}

impl CompiledFormatRule {
    /// Test a value against the rule's pattern.
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A batch of format rules, compiled once up front.
///
/// Compiling at construction surfaces bad admin-supplied patterns as a
/// configuration error before any row is scanned, instead of mid-run.
#[derive(Debug, Clone, Default)]
pub struct FormatRuleSet {
    rules: Vec<CompiledFormatRule>,
}

impl FormatRuleSet {
    /// Compile a set of format rules.
    pub fn compile(rules: &[FormatRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern)?;
            compiled.push(CompiledFormatRule {
                rule: rule.clone(),
                regex,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// All rules registered for a column, in registry order.
    pub fn for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CompiledFormatRule> {
        self.rules.iter().filter(move |r| r.rule.column == column)
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_match() {
        let rules = vec![FormatRule::new(
            "P_TEL",
            r"^\+41\d{9}$",
            "Phone must use +41 format",
        )];
        let set = FormatRuleSet::compile(&rules).unwrap();

        let rule = set.for_column("P_TEL").next().unwrap();
        assert!(rule.matches("+41791234567"));
        assert!(!rule.matches("0041791234567"));
        assert!(set.for_column("S_NAME").next().is_none());
    }

    #[test]
    fn test_bad_pattern_is_config_time_error() {
        let rules = vec![FormatRule::new("S_AHV", r"756\.(\d{4", "broken")];
        assert!(FormatRuleSet::compile(&rules).is_err());
    }
}
