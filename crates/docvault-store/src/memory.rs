//! In-memory implementation of the DocumentStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use docvault_core::{DocumentId, GroupId};

use crate::error::{Result, StoreError};
use crate::records::{DocumentGroup, DocumentRecord};
use crate::traits::DocumentStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    documents: HashMap<DocumentId, DocumentRecord>,
    groups: HashMap<GroupId, DocumentGroup>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                documents: HashMap::new(),
                groups: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, record: &DocumentRecord) -> Result<()> {
        let mut inner = self.write()?;
        if inner.documents.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        inner.documents.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(self.read()?.documents.get(&id).cloned())
    }

    async fn list_documents(&self, group: Option<GroupId>) -> Result<Vec<DocumentRecord>> {
        let inner = self.read()?;
        let mut docs: Vec<DocumentRecord> = inner
            .documents
            .values()
            .filter(|d| group.is_none() || d.group_id == group)
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.created_at);
        Ok(docs)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        Ok(self.write()?.documents.remove(&id).is_some())
    }

    async fn insert_group(&self, group: &DocumentGroup) -> Result<()> {
        let mut inner = self.write()?;
        if inner.groups.contains_key(&group.id) {
            return Err(StoreError::Duplicate(group.id.to_string()));
        }
        inner.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<DocumentGroup>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::ActorId;

    fn record(group: Option<GroupId>) -> DocumentRecord {
        let id = DocumentId::generate();
        DocumentRecord {
            id,
            name: "report.pdf".into(),
            group_id: group,
            size: 1234,
            storage_path: format!("{id}.enc"),
            uploaded_by: ActorId::generate(),
            created_at: 1_000,
        }
    }

    #[tokio::test]
    async fn test_document_roundtrip() {
        let store = MemoryStore::new();
        let rec = record(None);
        store.insert_document(&rec).await.unwrap();

        assert_eq!(store.get_document(rec.id).await.unwrap().unwrap(), rec);
        assert!(store.delete_document(rec.id).await.unwrap());
        assert!(store.get_document(rec.id).await.unwrap().is_none());
        assert!(!store.delete_document(rec.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let rec = record(None);
        store.insert_document(&rec).await.unwrap();
        assert!(matches!(
            store.insert_document(&rec).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_group() {
        let store = MemoryStore::new();
        let group = GroupId::generate();
        let in_group = record(Some(group));
        let outside = record(None);
        store.insert_document(&in_group).await.unwrap();
        store.insert_document(&outside).await.unwrap();

        let listed = store.list_documents(Some(group)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, in_group.id);

        assert_eq!(store.list_documents(None).await.unwrap().len(), 2);
    }
}
