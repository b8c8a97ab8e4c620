//! DocumentStore trait: the abstract interface for metadata persistence.
//!
//! This trait allows the vault to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use docvault_core::{DocumentId, GroupId};

use crate::error::Result;
use crate::records::{DocumentGroup, DocumentRecord};

/// Async interface for document-metadata persistence.
///
/// # Design Notes
///
/// - **Narrow surface**: create/query/delete rows; no streaming, no blobs.
/// - **Idempotent deletes**: deleting a missing document returns `false`,
///   not an error, so batch rollback can sweep unconditionally.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document row. Fails on duplicate id.
    async fn insert_document(&self, record: &DocumentRecord) -> Result<()>;

    /// Get a document row by id.
    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>>;

    /// List documents, optionally restricted to a group.
    async fn list_documents(&self, group: Option<GroupId>) -> Result<Vec<DocumentRecord>>;

    /// Delete a document row. Returns whether a row existed.
    async fn delete_document(&self, id: DocumentId) -> Result<bool>;

    /// Insert a group row. Fails on duplicate id.
    async fn insert_group(&self, group: &DocumentGroup) -> Result<()>;

    /// Get a group row by id.
    async fn get_group(&self, id: GroupId) -> Result<Option<DocumentGroup>>;
}
