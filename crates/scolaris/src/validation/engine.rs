//! The rule-driven row/column validator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::violation::{Violation, ViolationKind};
use crate::error::Result;
use crate::input::ImportTable;
use crate::rules::{BusinessRule, ColumnDefinition, FormatRule, FormatRuleSet, RuleRegistry};

/// Applies a compiled rule registry to imported rows.
///
/// The engine is stateless: calling [`validate`](ValidationEngine::validate)
/// twice with the same table yields the same violations in the same order
/// (row-major, column definitions in registry order, business rules last).
pub struct ValidationEngine {
    columns: Vec<ColumnDefinition>,
    format_rules: FormatRuleSet,
    business_rules: Vec<BusinessRule>,
}

impl ValidationEngine {
    /// Build an engine from resolved rule configuration, compiling all
    /// patterns up front.
    ///
    /// Inline `ColumnDefinition::pattern` entries are folded into the format
    /// rule set so the scan only has one source of pattern checks.
    pub fn new(
        columns: Vec<ColumnDefinition>,
        format_rules: &[FormatRule],
        business_rules: Vec<BusinessRule>,
    ) -> Result<Self> {
        let mut all_rules: Vec<FormatRule> = Vec::with_capacity(format_rules.len());
        for column in &columns {
            if let Some(pattern) = &column.pattern {
                all_rules.push(FormatRule::new(
                    &column.key,
                    pattern.clone(),
                    format!(
                        "Value does not match the expected {} format",
                        column.expected_type.label()
                    ),
                ));
            }
        }
        all_rules.extend(format_rules.iter().cloned());

        Ok(Self {
            columns,
            format_rules: FormatRuleSet::compile(&all_rules)?,
            business_rules,
        })
    }

    /// Build an engine from a full registry.
    pub fn from_registry(registry: &RuleRegistry) -> Result<Self> {
        Self::new(
            registry.columns.clone(),
            &registry.format_rules,
            registry.business_rules.clone(),
        )
    }

    /// Validate every row against every rule.
    ///
    /// Checks never short-circuit: one row can produce a violation per
    /// constraint it breaks. Columns named by the registry but absent from
    /// the table are treated as empty, which makes a missing required column
    /// visible as per-row findings rather than silently passing.
    pub fn validate(&self, table: &ImportTable) -> Vec<Violation> {
        let mut violations = Vec::new();

        for row in 0..table.row_count() {
            for column in &self.columns {
                let value = table.value(row, &column.key).unwrap_or("");

                if ImportTable::is_empty_value(value) {
                    if column.required {
                        violations.push(Violation::new(
                            row,
                            &column.key,
                            value,
                            ViolationKind::MissingRequired,
                            "missing-required",
                        ));
                    }
                    // Format rules only apply to non-empty values.
                    continue;
                }

                for rule in self.format_rules.for_column(&column.key) {
                    if !rule.matches(value) {
                        violations.push(Violation::new(
                            row,
                            &column.key,
                            value,
                            ViolationKind::FormatViolation,
                            rule.rule.message.clone(),
                        ));
                    }
                }
            }

            for rule in &self.business_rules {
                if !rule.holds(table, row) {
                    let column = rule.reported_column();
                    let value = table.value(row, column).unwrap_or("");
                    violations.push(Violation::new(
                        row,
                        column,
                        value,
                        ViolationKind::BusinessRuleViolation,
                        rule.message.clone(),
                    ));
                }
            }
        }

        violations
    }
}

/// Aggregate counts over one validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Rows in the validated table.
    pub total_rows: usize,
    /// Rows with at least one violation.
    pub rows_with_violations: usize,
    /// Total violation count.
    pub total: usize,
    /// Violations per kind label.
    pub by_kind: BTreeMap<String, usize>,
}

impl ValidationSummary {
    /// Summarize a violation list.
    pub fn from_violations(total_rows: usize, violations: &[Violation]) -> Self {
        let mut rows: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();

        for v in violations {
            rows.insert(v.row);
            *by_kind.entry(v.kind.label().to_string()).or_insert(0) += 1;
        }

        Self {
            total_rows,
            rows_with_violations: rows.len(),
            total: violations.len(),
            by_kind,
        }
    }

    /// Whether the run produced no violations.
    pub fn is_clean(&self) -> bool {
        self.total == 0
    }
}
