//! The Vault: unified API for the DocVault system.
//!
//! Brings together streaming encryption, RBAC, bearer tokens, signed URLs,
//! and metadata persistence behind one facade.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use docvault_cipher::StreamCipher;
use docvault_core::{now_millis, ActorId, CallContext, DocumentId, GroupId, RoleId, VaultConfig};
use docvault_rbac::{AccessLevel, Actor, RbacEngine, Role, RoleRepository, Scope, ScopeRule};
use docvault_store::{DocumentGroup, DocumentRecord, DocumentStore};
use docvault_token::{AccessTokenService, SignedUrlService, TokenState, UrlPayload};

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::{Result, VaultError};

/// One file in an upload batch.
pub struct UploadRequest {
    /// Original file name.
    pub name: String,
    /// Group membership, if any.
    pub group_id: Option<GroupId>,
    /// The plaintext content stream.
    pub content: Box<dyn AsyncRead + Send + Unpin>,
}

impl UploadRequest {
    /// Create a request from any async byte source.
    pub fn new(
        name: impl Into<String>,
        content: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            group_id: None,
            content: Box::new(content),
        }
    }

    /// Attach the document to a group.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// The main Vault struct.
///
/// Provides a unified API for:
/// - Authenticating bearer tokens into call contexts
/// - Authorizing operations against the RBAC rule set
/// - Uploading and downloading encrypted documents
/// - Handing off access via signed URLs
pub struct Vault<S, R> {
    config: VaultConfig,
    cipher: StreamCipher,
    tokens: AccessTokenService,
    urls: SignedUrlService,
    rbac: RbacEngine<R>,
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S: DocumentStore, R: RoleRepository> Vault<S, R> {
    /// Create a vault instance.
    pub fn new(
        config: VaultConfig,
        store: Arc<S>,
        roles: Arc<R>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let cipher = StreamCipher::new(&config.cipher);
        let tokens = AccessTokenService::new(config.token.clone());
        let urls = SignedUrlService::new(config.url.clone());
        let rbac = RbacEngine::new(roles, config.rbac_enabled);
        Self {
            config,
            cipher,
            tokens,
            urls,
            rbac,
            store,
            audit,
        }
    }

    /// The metadata store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The role repository.
    pub fn roles(&self) -> &Arc<R> {
        self.rbac.repository()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify credentials and issue a bearer token.
    ///
    /// Locked accounts and wrong passwords are rejected without revealing
    /// which check failed.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let Some(actor) = self.roles().find_actor_by_username(username).await? else {
            warn!(username, "login rejected: unknown user");
            self.audit.record(AuditEvent::new(AuditAction::LoginRejected));
            return Err(VaultError::BadCredentials);
        };
        if actor.locked {
            warn!(username, "login rejected: account locked");
            self.audit
                .record(AuditEvent::new(AuditAction::LoginRejected).actor(actor.id, username));
            return Err(VaultError::ActorLocked(actor.username));
        }
        if !actor.verify_password(password) {
            warn!(username, "login rejected: bad password");
            self.audit
                .record(AuditEvent::new(AuditAction::LoginRejected).actor(actor.id, username));
            return Err(VaultError::BadCredentials);
        }

        let ctx = CallContext::new(actor.id, actor.username.clone(), actor.role_id);
        let token = self.tokens.issue(&ctx);
        self.audit
            .record(AuditEvent::new(AuditAction::Login).actor(actor.id, username));
        Ok(token)
    }

    /// Resolve an Authorization header into a call context.
    pub fn authenticate(&self, authorization: &str) -> Result<CallContext> {
        match self.tokens.verify_header(authorization) {
            TokenState::Valid(ctx) => Ok(ctx),
            TokenState::Expired => Err(VaultError::TokenExpired),
            TokenState::Invalid(reason) => Err(VaultError::TokenInvalid(reason)),
        }
    }

    /// Issue a token for an already-authenticated context.
    pub fn issue_token(&self, ctx: &CallContext) -> String {
        self.tokens.issue(ctx)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization guards
    // ─────────────────────────────────────────────────────────────────────────

    /// Require an access level on a scope for the context's role.
    pub async fn require(
        &self,
        ctx: &CallContext,
        scope: Scope,
        level: AccessLevel,
    ) -> Result<()> {
        self.rbac.require(ctx.role_id, scope, level).await?;
        Ok(())
    }

    /// Require an access level on one field of a scope.
    pub async fn require_field(
        &self,
        ctx: &CallContext,
        scope: Scope,
        field: &str,
        level: AccessLevel,
    ) -> Result<()> {
        self.rbac
            .require_field(ctx.role_id, scope, Some(field), level)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload a single document.
    pub async fn upload(&self, ctx: &CallContext, request: UploadRequest) -> Result<DocumentRecord> {
        let mut records = self.upload_batch(ctx, vec![request]).await?;
        Ok(records.pop().expect("batch of one"))
    }

    /// Upload a batch of documents.
    ///
    /// The batch is not transactional, but it is compensating: if any file
    /// fails to encrypt or persist, every artifact already written in this
    /// batch (blobs and rows) is deleted before the single aggregated
    /// failure is reported.
    pub async fn upload_batch(
        &self,
        ctx: &CallContext,
        requests: Vec<UploadRequest>,
    ) -> Result<Vec<DocumentRecord>> {
        self.require(ctx, Scope::Documents, AccessLevel::Edit).await?;

        let total = requests.len();
        let mut committed: Vec<DocumentRecord> = Vec::with_capacity(total);
        for request in requests {
            match self.persist_one(ctx, request).await {
                Ok(record) => committed.push(record),
                Err(e) => {
                    let done = committed.len();
                    self.rollback_batch(&committed).await;
                    self.audit.record(
                        AuditEvent::new(AuditAction::UploadRolledBack)
                            .actor(ctx.actor_id, &ctx.username),
                    );
                    warn!(total, committed = done, error = %e, "batch upload rolled back");
                    return Err(VaultError::UploadFailed {
                        total,
                        committed: done,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(committed)
    }

    /// Download a document, streaming decrypted bytes into `writer`.
    pub async fn download<W>(
        &self,
        ctx: &CallContext,
        id: DocumentId,
        writer: W,
    ) -> Result<DocumentRecord>
    where
        W: AsyncWrite + Unpin,
    {
        self.require(ctx, Scope::Documents, AccessLevel::View).await?;
        let record = self.stream_document(id, writer).await?;
        self.audit.record(
            AuditEvent::new(AuditAction::Download)
                .actor(ctx.actor_id, &ctx.username)
                .document(id),
        );
        Ok(record)
    }

    /// List documents, optionally restricted to a group.
    pub async fn list_documents(
        &self,
        ctx: &CallContext,
        group: Option<GroupId>,
    ) -> Result<Vec<DocumentRecord>> {
        self.require(ctx, Scope::Documents, AccessLevel::View).await?;
        Ok(self.store.list_documents(group).await?)
    }

    /// Create a document group.
    pub async fn create_group(&self, ctx: &CallContext, name: &str) -> Result<DocumentGroup> {
        self.require(ctx, Scope::DocumentGroups, AccessLevel::Edit)
            .await?;
        let group = DocumentGroup {
            id: GroupId::generate(),
            name: name.to_string(),
            created_at: now_millis(),
        };
        self.store.insert_group(&group).await?;
        Ok(group)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signed URL handoff
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a time-limited URL for one document.
    pub async fn issue_document_url(
        &self,
        ctx: &CallContext,
        base_path: &str,
        id: DocumentId,
    ) -> Result<String> {
        self.require(ctx, Scope::Documents, AccessLevel::View).await?;
        if self.store.get_document(id).await?.is_none() {
            return Err(VaultError::DocumentNotFound(id));
        }
        let url = self.urls.generate(base_path, UrlPayload::Document(id));
        self.audit.record(
            AuditEvent::new(AuditAction::UrlIssued)
                .actor(ctx.actor_id, &ctx.username)
                .document(id),
        );
        Ok(url)
    }

    /// Issue a time-limited URL covering every document in a group.
    pub async fn issue_group_url(
        &self,
        ctx: &CallContext,
        base_path: &str,
        group_id: GroupId,
    ) -> Result<String> {
        self.require(ctx, Scope::Documents, AccessLevel::View).await?;
        if self.store.get_group(group_id).await?.is_none() {
            return Err(VaultError::UrlScopeMismatch);
        }
        let url = self.urls.generate(base_path, UrlPayload::Group(group_id));
        self.audit.record(
            AuditEvent::new(AuditAction::UrlIssued)
                .actor(ctx.actor_id, &ctx.username)
                .group(group_id),
        );
        Ok(url)
    }

    /// Download via a signed document URL, with no session.
    pub async fn download_by_url<W>(&self, url: &str, writer: W) -> Result<DocumentRecord>
    where
        W: AsyncWrite + Unpin,
    {
        let UrlPayload::Document(id) = self.urls.validate(url)? else {
            return Err(VaultError::UrlScopeMismatch);
        };
        let record = self.stream_document(id, writer).await?;
        self.audit
            .record(AuditEvent::new(AuditAction::UrlDownload).document(id));
        Ok(record)
    }

    /// Download one member of a group via a signed group URL.
    pub async fn download_group_member<W>(
        &self,
        url: &str,
        id: DocumentId,
        writer: W,
    ) -> Result<DocumentRecord>
    where
        W: AsyncWrite + Unpin,
    {
        let UrlPayload::Group(group_id) = self.urls.validate(url)? else {
            return Err(VaultError::UrlScopeMismatch);
        };
        let Some(record) = self.store.get_document(id).await? else {
            return Err(VaultError::DocumentNotFound(id));
        };
        if record.group_id != Some(group_id) {
            return Err(VaultError::UrlScopeMismatch);
        }
        let record = self.stream_document(id, writer).await?;
        self.audit.record(
            AuditEvent::new(AuditAction::UrlDownload)
                .document(id)
                .group(group_id),
        );
        Ok(record)
    }

    /// List the documents a signed group URL covers.
    pub async fn list_by_url(&self, url: &str) -> Result<Vec<DocumentRecord>> {
        let UrlPayload::Group(group_id) = self.urls.validate(url)? else {
            return Err(VaultError::UrlScopeMismatch);
        };
        Ok(self.store.list_documents(Some(group_id)).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // RBAC administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a role.
    pub async fn create_role(&self, ctx: &CallContext, role: &Role) -> Result<()> {
        self.require(ctx, Scope::RbacAdmin, AccessLevel::Edit).await?;
        self.roles().insert_role(role).await?;
        Ok(())
    }

    /// Create an actor with a hashed credential.
    pub async fn create_actor(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &str,
        role_id: RoleId,
    ) -> Result<Actor> {
        self.require(ctx, Scope::RbacAdmin, AccessLevel::Edit).await?;
        let actor = Actor::new(username, password, role_id)?;
        self.roles().insert_actor(&actor).await?;
        Ok(actor)
    }

    /// Replace a role's rule set atomically.
    pub async fn replace_role_rules(
        &self,
        ctx: &CallContext,
        role_id: RoleId,
        rules: Vec<ScopeRule>,
    ) -> Result<()> {
        self.require(ctx, Scope::RbacAdmin, AccessLevel::Edit).await?;
        self.roles().replace_rules(role_id, rules).await?;
        Ok(())
    }

    /// Replace one scope rule of a role, leaving the others untouched.
    pub async fn replace_scope_rule(
        &self,
        ctx: &CallContext,
        role_id: RoleId,
        rule: ScopeRule,
    ) -> Result<()> {
        self.require(ctx, Scope::RbacAdmin, AccessLevel::Edit).await?;
        self.roles().replace_scope_rule(role_id, rule).await?;
        Ok(())
    }

    /// Lock or unlock an actor.
    pub async fn set_actor_locked(
        &self,
        ctx: &CallContext,
        actor_id: ActorId,
        locked: bool,
    ) -> Result<()> {
        self.require(ctx, Scope::RbacAdmin, AccessLevel::Edit).await?;
        self.roles().set_actor_locked(actor_id, locked).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn blob_path(&self, storage_path: &str) -> PathBuf {
        self.config.storage_root.join(storage_path)
    }

    /// Encrypt one upload to disk and persist its metadata row.
    ///
    /// Any failure removes the partial blob before returning, so no
    /// half-written ciphertext is left behind as if it were valid.
    async fn persist_one(
        &self,
        ctx: &CallContext,
        request: UploadRequest,
    ) -> Result<DocumentRecord> {
        let id = DocumentId::generate();
        let storage_path = format!("{id}.enc");
        let blob = self.blob_path(&storage_path);

        tokio::fs::create_dir_all(&self.config.storage_root).await?;
        let mut file = tokio::fs::File::create(&blob).await?;

        let size = match self.cipher.encrypt(request.content, &mut file).await {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&blob).await;
                return Err(e.into());
            }
        };
        if let Err(e) = file.sync_all().await {
            drop(file);
            let _ = tokio::fs::remove_file(&blob).await;
            return Err(e.into());
        }
        drop(file);

        let record = DocumentRecord {
            id,
            name: request.name,
            group_id: request.group_id,
            size,
            storage_path,
            uploaded_by: ctx.actor_id,
            created_at: now_millis(),
        };
        if let Err(e) = self.store.insert_document(&record).await {
            let _ = tokio::fs::remove_file(&blob).await;
            return Err(e.into());
        }

        debug!(document = %id, size, "document stored");
        self.audit.record(
            AuditEvent::new(AuditAction::Upload)
                .actor(ctx.actor_id, &ctx.username)
                .document(id),
        );
        Ok(record)
    }

    /// Compensating deletion for an aborted batch.
    async fn rollback_batch(&self, committed: &[DocumentRecord]) {
        for record in committed {
            if let Err(e) = self.store.delete_document(record.id).await {
                warn!(document = %record.id, error = %e, "rollback: row deletion failed");
            }
            if let Err(e) = tokio::fs::remove_file(self.blob_path(&record.storage_path)).await {
                warn!(document = %record.id, error = %e, "rollback: blob deletion failed");
            }
        }
    }

    /// Look up a document and stream its decrypted content.
    async fn stream_document<W>(&self, id: DocumentId, mut writer: W) -> Result<DocumentRecord>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(record) = self.store.get_document(id).await? else {
            return Err(VaultError::DocumentNotFound(id));
        };
        let file = tokio::fs::File::open(self.blob_path(&record.storage_path)).await?;
        self.cipher.decrypt(file, &mut writer).await?;
        debug!(document = %id, "document streamed");
        Ok(record)
    }
}
