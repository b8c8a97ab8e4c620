//! # DocVault Store
//!
//! Persistence for document metadata and RBAC rows.
//!
//! The [`DocumentStore`] trait keeps the vault storage-agnostic.
//! Implementations: SQLite (primary) and in-memory (for tests). The SQLite
//! store also implements the RBAC [`RoleRepository`] over the same database.
//!
//! [`RoleRepository`]: docvault_rbac::RoleRepository

pub mod error;
pub mod memory;
pub mod migration;
pub mod records;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use records::{DocumentGroup, DocumentRecord};
pub use sqlite::SqliteStore;
pub use traits::DocumentStore;
