//! Permission resolution.
//!
//! Resolution is a pure function over a role's rule set; the engine adds
//! repository lookup and the enabled/disabled switch on top.

use std::sync::Arc;

use docvault_core::RoleId;

use crate::error::{RbacError, Result};
use crate::level::AccessLevel;
use crate::repository::RoleRepository;
use crate::role::Role;
use crate::scope::Scope;

/// Resolve the effective access level of `role` on `scope`.
///
/// A super role resolves to `Full` unconditionally. Without a matching scope
/// rule the level is `None`. A supplied field name consults the rule's field
/// overrides; fields without an override inherit the rule's level.
pub fn resolve(role: &Role, scope: Scope, field: Option<&str>) -> AccessLevel {
    if role.is_super {
        return AccessLevel::Full;
    }
    let Some(rule) = role.rule_for(scope) else {
        return AccessLevel::None;
    };
    match field {
        None => rule.level,
        Some(name) => rule.field_level(name).unwrap_or(rule.level),
    }
}

/// The RBAC engine: repository-backed resolution and authorization guards.
pub struct RbacEngine<R> {
    repo: Arc<R>,
    enabled: bool,
}

impl<R: RoleRepository> RbacEngine<R> {
    /// Create an engine over a role repository.
    ///
    /// When `enabled` is false the guards are no-ops; resolution still
    /// consults the real rules.
    pub fn new(repo: Arc<R>, enabled: bool) -> Self {
        Self { repo, enabled }
    }

    /// Whether authorization is enforced.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Resolve the effective level for a role id. Unknown roles fail closed
    /// to `None`.
    pub async fn resolve_level(
        &self,
        role_id: RoleId,
        scope: Scope,
        field: Option<&str>,
    ) -> Result<AccessLevel> {
        match self.repo.find_role(role_id).await? {
            Some(role) => Ok(resolve(&role, scope, field)),
            None => Ok(AccessLevel::None),
        }
    }

    /// Require `required` on `scope` for the role, failing with
    /// `PermissionDenied` otherwise.
    pub async fn require(&self, role_id: RoleId, scope: Scope, required: AccessLevel) -> Result<()> {
        self.require_field(role_id, scope, None, required).await
    }

    /// Require `required` on `scope` (optionally a specific field) for the
    /// role.
    pub async fn require_field(
        &self,
        role_id: RoleId,
        scope: Scope,
        field: Option<&str>,
        required: AccessLevel,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let level = self.resolve_level(role_id, scope, field).await?;
        if level.permits(required) {
            Ok(())
        } else {
            Err(RbacError::PermissionDenied { scope, required })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRoleStore;
    use crate::rule::ScopeRule;
    use proptest::prelude::*;

    fn editor() -> Role {
        Role::new("editor").with_rule(
            ScopeRule::new(Scope::Documents, AccessLevel::Edit)
                .with_field("owner", AccessLevel::View),
        )
    }

    #[test]
    fn test_super_role_bypasses_everything() {
        let role = Role::new_super("root");
        for scope in Scope::ALL {
            assert_eq!(resolve(&role, scope, None), AccessLevel::Full);
            assert_eq!(resolve(&role, scope, Some("anything")), AccessLevel::Full);
        }
    }

    #[test]
    fn test_missing_scope_rule_fails_closed() {
        let role = editor();
        assert_eq!(resolve(&role, Scope::SystemAdmin, None), AccessLevel::None);
    }

    #[test]
    fn test_scope_level_without_field() {
        let role = editor();
        assert_eq!(resolve(&role, Scope::Documents, None), AccessLevel::Edit);
    }

    #[test]
    fn test_field_override_takes_precedence() {
        let role = editor();
        assert_eq!(
            resolve(&role, Scope::Documents, Some("owner")),
            AccessLevel::View
        );
    }

    #[test]
    fn test_unlisted_field_inherits_scope_level() {
        let role = editor();
        assert_eq!(
            resolve(&role, Scope::Documents, Some("size")),
            AccessLevel::Edit
        );
    }

    #[tokio::test]
    async fn test_unknown_role_resolves_to_none() {
        let repo = Arc::new(MemoryRoleStore::new());
        let engine = RbacEngine::new(repo, true);
        let level = engine
            .resolve_level(RoleId::generate(), Scope::Documents, None)
            .await
            .unwrap();
        assert_eq!(level, AccessLevel::None);
    }

    #[tokio::test]
    async fn test_require_denies_and_permits() {
        let repo = Arc::new(MemoryRoleStore::new());
        let role = editor();
        let role_id = role.id;
        repo.insert_role(&role).await.unwrap();
        let engine = RbacEngine::new(repo, true);

        engine
            .require(role_id, Scope::Documents, AccessLevel::View)
            .await
            .unwrap();
        engine
            .require(role_id, Scope::Documents, AccessLevel::Edit)
            .await
            .unwrap();
        let err = engine
            .require(role_id, Scope::Documents, AccessLevel::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, RbacError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_disabled_engine_skips_guards() {
        let repo = Arc::new(MemoryRoleStore::new());
        let engine = RbacEngine::new(repo, false);
        // No role exists at all; the guard still passes.
        engine
            .require(RoleId::generate(), Scope::SystemAdmin, AccessLevel::Full)
            .await
            .unwrap();
    }

    proptest! {
        /// If a role is authorized for a level, it is authorized for every
        /// lower level on the same scope and field.
        #[test]
        fn prop_resolution_is_monotone(
            granted in 0u8..4,
            lo in 0u8..4,
            hi in 0u8..4,
        ) {
            let granted = AccessLevel::from_u8(granted).unwrap();
            let lo = AccessLevel::from_u8(lo).unwrap();
            let hi = AccessLevel::from_u8(hi).unwrap();

            let role = Role::new("r").with_rule(ScopeRule::new(Scope::Documents, granted));
            let resolved = resolve(&role, Scope::Documents, None);
            if lo <= hi && resolved.permits(hi) {
                prop_assert!(resolved.permits(lo));
            }
        }
    }
}
