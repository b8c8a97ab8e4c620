//! Role/actor repository: the abstract lookup interface.
//!
//! The RBAC engine and the token service depend only on this trait, never on
//! a concrete storage mechanism. The in-memory implementation here serves
//! tests and embedded use; a SQLite implementation lives in docvault-store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use docvault_core::{ActorId, RoleId};

use crate::actor::Actor;
use crate::error::{RbacError, Result};
use crate::role::Role;
use crate::rule::ScopeRule;

/// Async interface for role and actor lookup and administration.
///
/// # Design Notes
///
/// - **Read-mostly**: resolution reads dominate; administrative writes are
///   rare.
/// - **Atomic rule replacement**: `replace_rules` swaps a role's entire rule
///   set in one step. Concurrent readers observe either the old set or the
///   new set in full, never a mix.
/// - **Fail-closed lookups**: a missing role or actor is `Ok(None)`; only
///   backend faults are errors.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Look up a role by id.
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>>;

    /// Look up an actor by id.
    async fn find_actor(&self, id: ActorId) -> Result<Option<Actor>>;

    /// Look up an actor by username.
    async fn find_actor_by_username(&self, username: &str) -> Result<Option<Actor>>;

    /// Insert a new role.
    async fn insert_role(&self, role: &Role) -> Result<()>;

    /// Insert a new actor. Fails on duplicate username.
    async fn insert_actor(&self, actor: &Actor) -> Result<()>;

    /// Replace a role's entire rule set atomically.
    ///
    /// Old rules are fully removed and the new ones written as one unit, or
    /// the operation fails without partial replacement.
    async fn replace_rules(&self, role_id: RoleId, rules: Vec<ScopeRule>) -> Result<()>;

    /// Replace one scope rule (including its field rules) atomically,
    /// leaving the role's other scope rules untouched.
    ///
    /// Inserts the rule if the role had none for that scope.
    async fn replace_scope_rule(&self, role_id: RoleId, rule: ScopeRule) -> Result<()>;

    /// Lock or unlock an actor.
    async fn set_actor_locked(&self, id: ActorId, locked: bool) -> Result<()>;

    /// List all roles.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// List all actors.
    async fn list_actors(&self) -> Result<Vec<Actor>>;
}

/// In-memory repository implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; rule
/// replacement rebuilds the role under the write lock so readers never see a
/// half-replaced rule set.
pub struct MemoryRoleStore {
    inner: RwLock<MemoryRoleStoreInner>,
}

struct MemoryRoleStoreInner {
    roles: HashMap<RoleId, Role>,
    actors: HashMap<ActorId, Actor>,
    by_username: HashMap<String, ActorId>,
}

impl MemoryRoleStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryRoleStoreInner {
                roles: HashMap::new(),
                actors: HashMap::new(),
                by_username: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryRoleStoreInner>> {
        self.inner
            .read()
            .map_err(|e| RbacError::Repository(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryRoleStoreInner>> {
        self.inner
            .write()
            .map_err(|e| RbacError::Repository(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for MemoryRoleStore {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn find_actor(&self, id: ActorId) -> Result<Option<Actor>> {
        Ok(self.read()?.actors.get(&id).cloned())
    }

    async fn find_actor_by_username(&self, username: &str) -> Result<Option<Actor>> {
        let inner = self.read()?;
        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.actors.get(id))
            .cloned())
    }

    async fn insert_role(&self, role: &Role) -> Result<()> {
        self.write()?.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn insert_actor(&self, actor: &Actor) -> Result<()> {
        let mut inner = self.write()?;
        if inner.by_username.contains_key(&actor.username) {
            return Err(RbacError::DuplicateUsername(actor.username.clone()));
        }
        inner.by_username.insert(actor.username.clone(), actor.id);
        inner.actors.insert(actor.id, actor.clone());
        Ok(())
    }

    async fn replace_rules(&self, role_id: RoleId, rules: Vec<ScopeRule>) -> Result<()> {
        let mut inner = self.write()?;
        let role = inner
            .roles
            .get_mut(&role_id)
            .ok_or(RbacError::RoleNotFound(role_id))?;
        role.rules = rules;
        Ok(())
    }

    async fn replace_scope_rule(&self, role_id: RoleId, rule: ScopeRule) -> Result<()> {
        let mut inner = self.write()?;
        let role = inner
            .roles
            .get_mut(&role_id)
            .ok_or(RbacError::RoleNotFound(role_id))?;
        match role.rules.iter_mut().find(|r| r.scope == rule.scope) {
            Some(existing) => *existing = rule,
            None => role.rules.push(rule),
        }
        Ok(())
    }

    async fn set_actor_locked(&self, id: ActorId, locked: bool) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(actor) = inner.actors.get_mut(&id) {
            actor.locked = locked;
        }
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        Ok(self.read()?.actors.values().cloned().collect())
    }
}
