//! Scope rules and field-level overrides.

use serde::{Deserialize, Serialize};

use crate::level::AccessLevel;
use crate::scope::Scope;

/// Narrows or overrides the parent scope rule's level for one named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// The field of the protected resource this rule applies to.
    pub field: String,

    /// The level that replaces the scope rule's level for this field.
    pub level: AccessLevel,
}

impl FieldRule {
    /// Create a field rule.
    pub fn new(field: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            field: field.into(),
            level,
        }
    }
}

/// Grants an access level on one scope, with optional field overrides.
///
/// Fields without a matching [`FieldRule`] inherit the rule's level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRule {
    /// The scope this rule covers.
    pub scope: Scope,

    /// The level granted uniformly, absent a field override.
    pub level: AccessLevel,

    /// Per-field overrides.
    pub field_rules: Vec<FieldRule>,
}

impl ScopeRule {
    /// Create a rule with no field overrides.
    pub fn new(scope: Scope, level: AccessLevel) -> Self {
        Self {
            scope,
            level,
            field_rules: Vec::new(),
        }
    }

    /// Add a field override.
    pub fn with_field(mut self, field: impl Into<String>, level: AccessLevel) -> Self {
        self.field_rules.push(FieldRule::new(field, level));
        self
    }

    /// The override level for a field, if one is configured.
    pub fn field_level(&self, field: &str) -> Option<AccessLevel> {
        self.field_rules
            .iter()
            .find(|r| r.field == field)
            .map(|r| r.level)
    }
}
