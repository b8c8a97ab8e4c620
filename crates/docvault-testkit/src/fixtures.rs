//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a validated configuration, an
//! in-memory store pair, and a seeded role/actor population.

use std::sync::Arc;

use tempfile::TempDir;

use docvault_cipher::StreamCipher;
use docvault_core::{CallContext, VaultConfig, VaultSettings};
use docvault_rbac::{
    AccessLevel, Actor, MemoryRoleStore, Role, RoleRepository, Scope, ScopeRule,
};
use docvault_store::MemoryStore;
use docvault_token::{AccessTokenService, SignedUrlService};

/// Password seeded for the super-role actor.
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Password seeded for the editor actor.
pub const EDITOR_PASSWORD: &str = "editor-password";

/// Password seeded for the viewer actor.
pub const VIEWER_PASSWORD: &str = "viewer-password";

/// A test fixture with validated config, in-memory stores, and three actors:
/// a super-role admin, an editor, and a viewer.
pub struct TestFixture {
    pub config: VaultConfig,
    pub store: Arc<MemoryStore>,
    pub roles: Arc<MemoryRoleStore>,
    pub admin: Actor,
    pub editor: Actor,
    pub viewer: Actor,
    /// Keeps the blob directory alive for the fixture's lifetime.
    _storage: TempDir,
}

impl TestFixture {
    /// Create a fixture with the default seeded population.
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Create a fixture, tweaking the raw settings before validation.
    pub async fn with_settings(tweak: impl FnOnce(&mut VaultSettings)) -> Self {
        let storage = TempDir::new().expect("tempdir");
        let mut settings = default_settings(&storage);
        tweak(&mut settings);
        let config = VaultConfig::from_settings(&settings).expect("valid test settings");

        let roles = Arc::new(MemoryRoleStore::new());

        let admin_role = Role::new_super("admin");
        let editor_role = Role::new("editor")
            .with_rule(ScopeRule::new(Scope::Documents, AccessLevel::Edit))
            .with_rule(ScopeRule::new(Scope::DocumentGroups, AccessLevel::Edit));
        let viewer_role =
            Role::new("viewer").with_rule(ScopeRule::new(Scope::Documents, AccessLevel::View));

        let admin = Actor::new("admin", ADMIN_PASSWORD, admin_role.id).expect("hash");
        let editor = Actor::new("editor", EDITOR_PASSWORD, editor_role.id).expect("hash");
        let viewer = Actor::new("viewer", VIEWER_PASSWORD, viewer_role.id).expect("hash");

        for role in [&admin_role, &editor_role, &viewer_role] {
            roles.insert_role(role).await.expect("seed role");
        }
        for actor in [&admin, &editor, &viewer] {
            roles.insert_actor(actor).await.expect("seed actor");
        }

        Self {
            config,
            store: Arc::new(MemoryStore::new()),
            roles,
            admin,
            editor,
            viewer,
            _storage: storage,
        }
    }

    /// Build the call context an authenticated request would carry.
    pub fn context_for(&self, actor: &Actor) -> CallContext {
        CallContext::new(actor.id, actor.username.clone(), actor.role_id)
    }

    /// A stream cipher over the fixture's key.
    pub fn cipher(&self) -> StreamCipher {
        StreamCipher::new(&self.config.cipher)
    }

    /// A token service over the fixture's secrets.
    pub fn token_service(&self) -> AccessTokenService {
        AccessTokenService::new(self.config.token.clone())
    }

    /// A signed-URL service over the fixture's secrets.
    pub fn url_service(&self) -> SignedUrlService {
        SignedUrlService::new(self.config.url.clone())
    }
}

/// Raw settings pointing at a temporary storage root.
fn default_settings(storage: &TempDir) -> VaultSettings {
    VaultSettings {
        cipher_algorithm: "chacha20poly1305".into(),
        cipher_key_hex: hex::encode([0x42u8; 32]),
        token_secret: "test-token-secret".into(),
        issuer: "docvault-test".into(),
        audience: "docvault-test-api".into(),
        token_lifetime_secs: 600,
        url_secret: "test-url-secret".into(),
        url_expiry_secs: 300,
        url_encrypt_payload: false,
        rbac_enabled: true,
        storage_root: storage.path().to_path_buf(),
    }
}
