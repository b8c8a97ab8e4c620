//! Failure injection for batch-rollback tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use docvault_core::{DocumentId, GroupId};
use docvault_store::{
    DocumentGroup, DocumentRecord, DocumentStore, Result, StoreError,
};

/// Wraps a DocumentStore and fails `insert_document` after a set number of
/// successful inserts. Every other operation passes through.
pub struct FailingStore<S> {
    inner: S,
    fail_after: usize,
    inserts: AtomicUsize,
}

impl<S> FailingStore<S> {
    /// Fail the insert that would be number `fail_after + 1`.
    pub fn fail_after(inner: S, fail_after: usize) -> Self {
        Self {
            inner,
            fail_after,
            inserts: AtomicUsize::new(0),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FailingStore<S> {
    async fn insert_document(&self, record: &DocumentRecord) -> Result<()> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            return Err(StoreError::Duplicate("injected failure".into()));
        }
        self.inner.insert_document(record).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        self.inner.get_document(id).await
    }

    async fn list_documents(&self, group: Option<GroupId>) -> Result<Vec<DocumentRecord>> {
        self.inner.list_documents(group).await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        self.inner.delete_document(id).await
    }

    async fn insert_group(&self, group: &DocumentGroup) -> Result<()> {
        self.inner.insert_group(group).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<DocumentGroup>> {
        self.inner.get_group(id).await
    }
}
