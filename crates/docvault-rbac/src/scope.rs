//! Protected resource categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed category of protected resources and operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Document upload, download, and metadata.
    Documents,
    /// Document group management.
    DocumentGroups,
    /// Role and rule administration.
    RbacAdmin,
    /// System-wide administration.
    SystemAdmin,
    /// Reading the audit trail.
    AuditLog,
}

impl Scope {
    /// Stable storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Documents => "documents",
            Scope::DocumentGroups => "document-groups",
            Scope::RbacAdmin => "rbac-admin",
            Scope::SystemAdmin => "system-admin",
            Scope::AuditLog => "audit-log",
        }
    }

    /// Parse from the stable storage name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "documents" => Some(Scope::Documents),
            "document-groups" => Some(Scope::DocumentGroups),
            "rbac-admin" => Some(Scope::RbacAdmin),
            "system-admin" => Some(Scope::SystemAdmin),
            "audit-log" => Some(Scope::AuditLog),
            _ => None,
        }
    }

    /// All scopes, for administrative listings.
    pub const ALL: [Scope; 5] = [
        Scope::Documents,
        Scope::DocumentGroups,
        Scope::RbacAdmin,
        Scope::SystemAdmin,
        Scope::AuditLog,
    ];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for scope in Scope::ALL {
            assert_eq!(Scope::parse(scope.as_str()), Some(scope));
        }
        assert_eq!(Scope::parse("unknown"), None);
    }
}
