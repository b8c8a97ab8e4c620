//! Metadata row types.

use serde::{Deserialize, Serialize};

use docvault_core::{ActorId, DocumentId, GroupId};

/// Metadata for one stored document. The encrypted blob itself lives on the
/// filesystem at `storage_path`, relative to the vault's storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier.
    pub id: DocumentId,

    /// Original file name.
    pub name: String,

    /// Group membership, if any.
    pub group_id: Option<GroupId>,

    /// Plaintext length in bytes.
    pub size: u64,

    /// Blob location relative to the storage root.
    pub storage_path: String,

    /// The actor that uploaded the document.
    pub uploaded_by: ActorId,

    /// Creation time (Unix ms).
    pub created_at: i64,
}

/// A named group of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGroup {
    /// Unique group identifier.
    pub id: GroupId,

    /// Group name.
    pub name: String,

    /// Creation time (Unix ms).
    pub created_at: i64,
}
