//! End-to-end pipeline tests: login, upload, download, signed URL handoff,
//! batch rollback, and authorization guards working together.

use std::sync::{Arc, Mutex};

use docvault::{
    AccessLevel, AuditAction, AuditEvent, AuditSink, Scope, UploadRequest, Vault, VaultError,
};
use docvault_rbac::{RbacError, Role, ScopeRule};
use docvault_store::{DocumentStore, MemoryStore};
use docvault_testkit::{FailingStore, TestFixture, VIEWER_PASSWORD};

/// Audit sink that collects events for assertions.
#[derive(Default)]
struct CollectingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl CollectingAuditSink {
    fn actions(&self) -> Vec<AuditAction> {
        self.events.lock().unwrap().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for CollectingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn vault_with_sink(
    fixture: &TestFixture,
) -> (
    Vault<MemoryStore, docvault_rbac::MemoryRoleStore>,
    Arc<CollectingAuditSink>,
) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let sink = Arc::new(CollectingAuditSink::default());
    let vault = Vault::new(
        fixture.config.clone(),
        fixture.store.clone(),
        fixture.roles.clone(),
        sink.clone(),
    );
    (vault, sink)
}

#[tokio::test]
async fn test_login_token_upload_download_roundtrip() -> anyhow::Result<()> {
    let fixture = TestFixture::new().await;
    let (vault, sink) = vault_with_sink(&fixture);

    // Authenticate the editor through the bearer-token path.
    let token = vault
        .login("editor", docvault_testkit::EDITOR_PASSWORD)
        .await?;
    let ctx = vault.authenticate(&format!("Bearer {token}"))?;
    assert_eq!(ctx.username, "editor");

    // Upload a document larger than one cipher chunk.
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let record = vault
        .upload(
            &ctx,
            UploadRequest::new("big.bin", std::io::Cursor::new(content.clone())),
        )
        .await?;
    assert_eq!(record.size, content.len() as u64);

    // The blob on disk is ciphertext, not the plaintext.
    let blob = std::fs::read(fixture.config.storage_root.join(&record.storage_path))?;
    assert_ne!(blob, content);

    // Download decrypts back to the original bytes.
    let mut out = Vec::new();
    vault.download(&ctx, record.id, &mut out).await?;
    assert_eq!(out, content);

    let actions = sink.actions();
    assert!(actions.contains(&AuditAction::Login));
    assert!(actions.contains(&AuditAction::Upload));
    assert!(actions.contains(&AuditAction::Download));
    Ok(())
}

#[tokio::test]
async fn test_viewer_cannot_upload_but_can_download() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);

    let editor = fixture.context_for(&fixture.editor);
    let record = vault
        .upload(&editor, UploadRequest::new("doc.txt", &b"shared"[..]))
        .await
        .unwrap();

    let viewer = fixture.context_for(&fixture.viewer);
    let err = vault
        .upload(&viewer, UploadRequest::new("nope.txt", &b"denied"[..]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Rbac(RbacError::PermissionDenied { .. })
    ));
    assert_eq!(err.public_message(), "access denied");

    let mut out = Vec::new();
    vault.download(&viewer, record.id, &mut out).await.unwrap();
    assert_eq!(out, b"shared");
}

#[tokio::test]
async fn test_super_role_bypasses_rule_set() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);

    // The admin role has no explicit rules at all, only is_super.
    let admin = fixture.context_for(&fixture.admin);
    vault
        .require(&admin, Scope::SystemAdmin, AccessLevel::Full)
        .await
        .unwrap();

    let role = Role::new("auditor")
        .with_rule(ScopeRule::new(Scope::AuditLog, AccessLevel::View));
    vault.create_role(&admin, &role).await.unwrap();
    vault
        .create_actor(&admin, "auditor", "auditor-pass", role.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_field_override_guard() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let admin = fixture.context_for(&fixture.admin);

    // Documents: Edit overall, but the "owner" field is view-only.
    let role = Role::new("clerk").with_rule(
        ScopeRule::new(Scope::Documents, AccessLevel::Edit)
            .with_field("owner", AccessLevel::View),
    );
    vault.create_role(&admin, &role).await.unwrap();
    let clerk = vault
        .create_actor(&admin, "clerk", "clerk-pass", role.id)
        .await
        .unwrap();
    let ctx = fixture.context_for(&clerk);

    vault
        .require_field(&ctx, Scope::Documents, "name", AccessLevel::Edit)
        .await
        .unwrap();
    let err = vault
        .require_field(&ctx, Scope::Documents, "owner", AccessLevel::Edit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Rbac(RbacError::PermissionDenied { .. })
    ));
}

#[tokio::test]
async fn test_locked_actor_cannot_login() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let admin = fixture.context_for(&fixture.admin);

    vault
        .set_actor_locked(&admin, fixture.viewer.id, true)
        .await
        .unwrap();
    let err = vault.login("viewer", VIEWER_PASSWORD).await.unwrap_err();
    assert!(matches!(err, VaultError::ActorLocked(_)));
    assert_eq!(err.public_message(), "access denied");
}

#[tokio::test]
async fn test_bad_credentials_and_bad_tokens() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);

    assert!(matches!(
        vault.login("viewer", "wrong-password").await.unwrap_err(),
        VaultError::BadCredentials
    ));
    assert!(matches!(
        vault.login("nobody", "whatever").await.unwrap_err(),
        VaultError::BadCredentials
    ));

    assert!(matches!(
        vault.authenticate("Bearer not-a-token").unwrap_err(),
        VaultError::TokenInvalid(_)
    ));
    assert!(matches!(
        vault.authenticate("Basic dXNlcjpwdw").unwrap_err(),
        VaultError::TokenInvalid(_)
    ));
}

#[tokio::test]
async fn test_signed_url_handoff() {
    let fixture = TestFixture::new().await;
    let (vault, sink) = vault_with_sink(&fixture);
    let editor = fixture.context_for(&fixture.editor);

    let record = vault
        .upload(&editor, UploadRequest::new("handoff.txt", &b"handed off"[..]))
        .await
        .unwrap();
    let url = vault
        .issue_document_url(&editor, "/files/download", record.id)
        .await
        .unwrap();

    // Stateless download: no context, no token.
    let mut out = Vec::new();
    vault.download_by_url(&url, &mut out).await.unwrap();
    assert_eq!(out, b"handed off");

    // Tampering with the expiry alone kills the URL.
    let exp = url.split("exp=").nth(1).unwrap().split('&').next().unwrap();
    let stretched = url.replace(&format!("exp={exp}"), "exp=9999999999");
    let err = vault
        .download_by_url(&stretched, &mut Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "access denied");

    let actions = sink.actions();
    assert!(actions.contains(&AuditAction::UrlIssued));
    assert!(actions.contains(&AuditAction::UrlDownload));
}

#[tokio::test]
async fn test_group_url_covers_members_only() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let editor = fixture.context_for(&fixture.editor);

    let group = vault.create_group(&editor, "contracts").await.unwrap();
    let inside_a = vault
        .upload(
            &editor,
            UploadRequest::new("a.txt", &b"aaa"[..]).with_group(group.id),
        )
        .await
        .unwrap();
    let _inside_b = vault
        .upload(
            &editor,
            UploadRequest::new("b.txt", &b"bbb"[..]).with_group(group.id),
        )
        .await
        .unwrap();
    let outside = vault
        .upload(&editor, UploadRequest::new("c.txt", &b"ccc"[..]))
        .await
        .unwrap();

    let url = vault
        .issue_group_url(&editor, "/files/group", group.id)
        .await
        .unwrap();

    assert_eq!(vault.list_by_url(&url).await.unwrap().len(), 2);

    let mut out = Vec::new();
    vault
        .download_group_member(&url, inside_a.id, &mut out)
        .await
        .unwrap();
    assert_eq!(out, b"aaa");

    // The group URL does not extend to documents outside the group.
    let err = vault
        .download_group_member(&url, outside.id, &mut Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::UrlScopeMismatch));

    // A group URL cannot stand in for a document URL.
    let err = vault.download_by_url(&url, &mut Vec::new()).await.unwrap_err();
    assert!(matches!(err, VaultError::UrlScopeMismatch));
}

#[tokio::test]
async fn test_upload_batch_rolls_back_on_failure() {
    let fixture = TestFixture::new().await;
    let sink = Arc::new(CollectingAuditSink::default());

    // The third metadata insert fails.
    let store = Arc::new(FailingStore::fail_after(MemoryStore::new(), 2));
    let vault = Vault::new(
        fixture.config.clone(),
        store.clone(),
        fixture.roles.clone(),
        sink.clone(),
    );
    let editor = fixture.context_for(&fixture.editor);

    let requests = vec![
        UploadRequest::new("one.txt", &b"first"[..]),
        UploadRequest::new("two.txt", &b"second"[..]),
        UploadRequest::new("three.txt", &b"third"[..]),
    ];
    let err = vault.upload_batch(&editor, requests).await.unwrap_err();
    let VaultError::UploadFailed { total, committed, .. } = err else {
        panic!("expected UploadFailed, got {err:?}");
    };
    assert_eq!(total, 3);
    assert_eq!(committed, 2);

    // No rows survive.
    assert!(store.inner().list_documents(None).await.unwrap().is_empty());

    // No blobs survive.
    let leftovers: Vec<_> = std::fs::read_dir(&fixture.config.storage_root)
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "blobs left behind: {leftovers:?}");

    assert!(sink.actions().contains(&AuditAction::UploadRolledBack));
}

#[tokio::test]
async fn test_rbac_disabled_authenticates_but_does_not_authorize() {
    let fixture = TestFixture::with_settings(|s| s.rbac_enabled = false).await;
    let (vault, _) = vault_with_sink(&fixture);

    // The viewer role only has View, but the guard is off.
    let viewer = fixture.context_for(&fixture.viewer);
    vault
        .upload(&viewer, UploadRequest::new("any.txt", &b"content"[..]))
        .await
        .unwrap();

    // Authentication is still enforced.
    assert!(vault.authenticate("Bearer garbage").is_err());
}

#[tokio::test]
async fn test_rule_replacement_changes_decisions_atomically() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let admin = fixture.context_for(&fixture.admin);
    let editor = fixture.context_for(&fixture.editor);

    vault
        .require(&editor, Scope::Documents, AccessLevel::Edit)
        .await
        .unwrap();

    // Demote the editor role to view-only.
    vault
        .replace_role_rules(
            &admin,
            fixture.editor.role_id,
            vec![ScopeRule::new(Scope::Documents, AccessLevel::View)],
        )
        .await
        .unwrap();

    let err = vault
        .require(&editor, Scope::Documents, AccessLevel::Edit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Rbac(RbacError::PermissionDenied { .. })
    ));
    vault
        .require(&editor, Scope::Documents, AccessLevel::View)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_encrypted_url_payload_round_trips() {
    let fixture = TestFixture::with_settings(|s| s.url_encrypt_payload = true).await;
    let (vault, _) = vault_with_sink(&fixture);
    let editor = fixture.context_for(&fixture.editor);

    let record = vault
        .upload(&editor, UploadRequest::new("sealed.txt", &b"sealed content"[..]))
        .await
        .unwrap();
    let url = vault
        .issue_document_url(&editor, "/files/download", record.id)
        .await
        .unwrap();

    // The document id is not visible in the URL.
    assert!(!url.contains(&record.id.to_string()));

    let mut out = Vec::new();
    vault.download_by_url(&url, &mut out).await.unwrap();
    assert_eq!(out, b"sealed content");
}

#[tokio::test]
async fn test_tampered_blob_fails_download() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let editor = fixture.context_for(&fixture.editor);

    let record = vault
        .upload(&editor, UploadRequest::new("victim.txt", &b"integrity matters"[..]))
        .await
        .unwrap();

    // Flip one ciphertext bit on disk.
    let path = fixture.config.storage_root.join(&record.storage_path);
    let mut blob = std::fs::read(&path).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    std::fs::write(&path, &blob).unwrap();

    let err = vault
        .download(&editor, record.id, &mut Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Cipher(e) if e.is_decryption_failure()));
}

#[tokio::test]
async fn test_empty_document_roundtrip() {
    let fixture = TestFixture::new().await;
    let (vault, _) = vault_with_sink(&fixture);
    let editor = fixture.context_for(&fixture.editor);

    let record = vault
        .upload(&editor, UploadRequest::new("empty.txt", &b""[..]))
        .await
        .unwrap();
    assert_eq!(record.size, 0);

    let mut out = Vec::new();
    vault.download(&editor, record.id, &mut out).await.unwrap();
    assert!(out.is_empty());
}
