//! Rule registry: column definitions, format rules, and business rules.
//!
//! All rule types are plain serde data so the admin configuration store can
//! supply them as JSON; the engine only consumes resolved values.

mod business;
mod column;
mod format;

use serde::{Deserialize, Serialize};

pub use business::{BusinessRule, BusinessRuleKind};
pub use column::{ColumnDefinition, ExpectedType};
pub use format::{CompiledFormatRule, FormatRule, FormatRuleSet};

/// The full rule configuration for one import-type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRegistry {
    /// Column definitions (requiredness, expected type).
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    /// Per-column format rules.
    #[serde(default)]
    pub format_rules: Vec<FormatRule>,
    /// Cross-column business rules.
    #[serde(default)]
    pub business_rules: Vec<BusinessRule>,
}

impl RuleRegistry {
    /// Load a registry from its JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the registry to pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_json_round_trip() {
        let json = r#"{
            "columns": [
                {"key": "S_NAME", "required": true, "expected_type": "text"},
                {"key": "P_TEL", "required": false, "expected_type": "phone"}
            ],
            "format_rules": [
                {"column": "P_TEL", "pattern": "^\\+41\\d{9}$", "message": "Phone must use +41 format"}
            ],
            "business_rules": [
                {
                    "kind": {"type": "required_together", "when_set": "P_TEL", "then_required": "P_NAME"},
                    "message": "Contact phone requires a contact name"
                }
            ]
        }"#;

        let registry = RuleRegistry::from_json(json).unwrap();
        assert_eq!(registry.columns.len(), 2);
        assert_eq!(registry.format_rules.len(), 1);
        assert_eq!(registry.business_rules.len(), 1);

        let back = RuleRegistry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(back.columns[0].key, "S_NAME");
    }
}
