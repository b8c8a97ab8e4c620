//! Error types for the vault facade.

use thiserror::Error;

use docvault_cipher::CipherError;
use docvault_core::DocumentId;
use docvault_rbac::RbacError;
use docvault_store::StoreError;
use docvault_token::{InvalidReason, UrlError};

/// Errors surfaced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Stream encryption/decryption failure.
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Bearer token was authentic but expired; the caller should
    /// re-authenticate.
    #[error("token expired")]
    TokenExpired,

    /// Bearer token failed verification.
    #[error("invalid token: {0:?}")]
    TokenInvalid(InvalidReason),

    /// Authorization or RBAC administration failure.
    #[error(transparent)]
    Rbac(#[from] RbacError),

    /// Signed URL validation failure.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// Batch upload failure, reported once after compensating deletion.
    #[error("upload failed after {committed} of {total} files: {reason}")]
    UploadFailed {
        total: usize,
        committed: usize,
        reason: String,
    },

    /// Login failure: unknown username or wrong password.
    #[error("invalid credentials")]
    BadCredentials,

    /// Login refused for a locked account.
    #[error("account locked: {0}")]
    ActorLocked(String),

    /// No such document.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The signed URL does not grant access to the requested resource.
    #[error("URL does not cover the requested resource")]
    UrlScopeMismatch,

    /// Metadata persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// The message safe to show an end user.
    ///
    /// Tampering, expiry, and permission detail stay internal; externally
    /// they collapse to a generic denial.
    pub fn public_message(&self) -> &'static str {
        match self {
            VaultError::TokenExpired => "authentication required",
            VaultError::TokenInvalid(_)
            | VaultError::Url(_)
            | VaultError::UrlScopeMismatch
            | VaultError::BadCredentials
            | VaultError::ActorLocked(_)
            | VaultError::Rbac(RbacError::PermissionDenied { .. }) => "access denied",
            VaultError::DocumentNotFound(_) => "not found",
            _ => "internal error",
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
