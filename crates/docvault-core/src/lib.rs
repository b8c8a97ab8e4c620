//! # DocVault Core
//!
//! Pure primitives for DocVault: typed key material, identifiers, the
//! per-request call context, and the process-wide configuration value.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`CipherKey`] / [`CipherNonce`] - symmetric AEAD key material
//! - [`MacKey`] / [`MacTag`] - keyed-Blake3 signing material
//! - [`CallContext`] - the authenticated identity claim attached to one request
//! - [`VaultConfig`] - explicit configuration constructed once at startup

pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod keys;
pub mod time;

pub use config::{CipherAlgorithm, CipherConfig, TokenConfig, UrlConfig, VaultConfig, VaultSettings};
pub use context::CallContext;
pub use error::{ConfigError, CoreError};
pub use ids::{ActorId, DocumentId, GroupId, RoleId};
pub use keys::{CipherKey, CipherNonce, MacKey, MacTag};
pub use time::{now_millis, now_secs};
