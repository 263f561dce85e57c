//! Column definitions supplied by the admin configuration.

use serde::{Deserialize, Serialize};

/// Expected content type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedType {
    /// Free text.
    Text,
    /// Whole numbers (class size, postal code).
    Integer,
    /// Calendar date.
    Date,
    /// Phone number.
    Phone,
    /// Swiss AHV social-security number.
    SocialSecurity,
}

impl ExpectedType {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ExpectedType::Text => "Text",
            ExpectedType::Integer => "Integer",
            ExpectedType::Date => "Date",
            ExpectedType::Phone => "Phone",
            ExpectedType::SocialSecurity => "Social Security Number",
        }
    }
}

/// Static configuration for one target column. Immutable during a
/// validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Target column key (e.g. `S_NAME`).
    pub key: String,
    /// Whether an empty value is a violation.
    #[serde(default)]
    pub required: bool,
    /// Expected content type.
    pub expected_type: ExpectedType,
    /// Optional validation pattern for this column, applied in addition to
    /// any registered format rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ColumnDefinition {
    /// Create a definition with the given key and type.
    pub fn new(key: impl Into<String>, expected_type: ExpectedType) -> Self {
        Self {
            key: key.into(),
            required: false,
            expected_type,
            pattern: None,
        }
    }

    /// Mark the column as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set an inline validation pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}
