//! Role definitions.

use serde::{Deserialize, Serialize};

use docvault_core::RoleId;

use crate::rule::ScopeRule;
use crate::scope::Scope;

/// A named role with its ordered set of scope rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,

    /// Unique role name.
    pub name: String,

    /// A super role bypasses all RBAC checks.
    pub is_super: bool,

    /// Scope rules, at most one per scope.
    pub rules: Vec<ScopeRule>,
}

impl Role {
    /// Create a role with no rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::generate(),
            name: name.into(),
            is_super: false,
            rules: Vec::new(),
        }
    }

    /// Create a super role.
    pub fn new_super(name: impl Into<String>) -> Self {
        Self {
            is_super: true,
            ..Self::new(name)
        }
    }

    /// Add a scope rule.
    pub fn with_rule(mut self, rule: ScopeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The rule covering a scope, if any.
    pub fn rule_for(&self, scope: Scope) -> Option<&ScopeRule> {
        self.rules.iter().find(|r| r.scope == scope)
    }
}
