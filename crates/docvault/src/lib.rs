//! # DocVault
//!
//! The unified vault API: encrypted document storage behind RBAC, bearer
//! tokens, and signed time-limited URLs.
//!
//! The [`Vault`] facade brings the four subsystems together:
//!
//! - per-file streaming encryption at rest (docvault-cipher)
//! - role/scope/field authorization (docvault-rbac)
//! - stateless bearer authentication (docvault-token)
//! - signed URL handoff without a session (docvault-token)
//!
//! A request arrives with a session-derived context, a bearer token, or a
//! signed URL; the vault authenticates it, consults the RBAC engine, then
//! streams blobs through the cipher engine.

pub mod audit;
pub mod error;
pub mod vault;

pub use audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink};
pub use error::{Result, VaultError};
pub use vault::{UploadRequest, Vault};

pub use docvault_core::{
    CallContext, CipherAlgorithm, VaultConfig, VaultSettings,
};
pub use docvault_rbac::{AccessLevel, Scope};
pub use docvault_token::{TokenState, UrlPayload};
