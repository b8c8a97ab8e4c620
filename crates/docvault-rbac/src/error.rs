//! Error types for the RBAC module.

use thiserror::Error;

use docvault_core::RoleId;

use crate::level::AccessLevel;
use crate::scope::Scope;

/// Errors that can occur during RBAC operations.
#[derive(Debug, Error)]
pub enum RbacError {
    /// The resolved level does not satisfy the required level.
    #[error("permission denied: {scope} requires {required}")]
    PermissionDenied {
        scope: Scope,
        required: AccessLevel,
    },

    /// Administrative operation on a role that does not exist.
    #[error("role not found: {0}")]
    RoleNotFound(RoleId),

    /// Username already taken.
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Credential hashing error.
    #[error("credential hash error: {0}")]
    CredentialHash(String),

    /// Repository backend failure.
    #[error("repository error: {0}")]
    Repository(String),
}

/// Result type for RBAC operations.
pub type Result<T> = std::result::Result<T, RbacError>;
