//! Violation records produced by the validation engine.

use serde::{Deserialize, Serialize};

/// Kind of constraint a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Required column is empty or missing.
    MissingRequired,
    /// Value does not match a registered format rule.
    FormatViolation,
    /// A cross-column business rule failed for the row.
    BusinessRuleViolation,
}

impl ViolationKind {
    /// Stable machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "missing-required",
            ViolationKind::FormatViolation => "format-violation",
            ViolationKind::BusinessRuleViolation => "business-rule-violation",
        }
    }
}

/// One finding for one row/column pair.
///
/// Violations are content results, not failures: a validation run that
/// finds a thousand of them still succeeded. `corrected_value` starts out
/// empty and is filled in once the user (or the correction memory) accepts
/// a fix, so the review UI can show before/after side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Zero-based row index into the validated table.
    pub row: usize,
    /// Target column key.
    pub column: String,
    /// The raw value that failed.
    pub original_value: String,
    /// Which constraint failed.
    pub kind: ViolationKind,
    /// Human-readable message from the violated rule.
    pub message: String,
    /// Accepted correction, once one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_value: Option<String>,
}

impl Violation {
    /// Create a new violation.
    pub fn new(
        row: usize,
        column: impl Into<String>,
        original_value: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            original_value: original_value.into(),
            kind,
            message: message.into(),
            corrected_value: None,
        }
    }

    /// Attach an accepted correction.
    pub fn with_correction(mut self, corrected: impl Into<String>) -> Self {
        self.corrected_value = Some(corrected.into());
        self
    }
}
