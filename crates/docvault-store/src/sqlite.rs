//! SQLite implementation of the DocumentStore and RoleRepository traits.
//!
//! This is the primary persistence backend. It uses rusqlite with bundled
//! SQLite behind a mutex; all statements are short-lived point queries.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use docvault_core::{ActorId, DocumentId, GroupId, RoleId};
use docvault_rbac::{Actor, RbacError, Role, RoleRepository, ScopeRule};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::records::{DocumentGroup, DocumentRecord};
use crate::traits::DocumentStore;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. Implements both metadata persistence and
/// the RBAC role repository over one database file.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Row mapping helpers
// ─────────────────────────────────────────────────────────────────────────

fn uuid_blob(uuid: &Uuid) -> [u8; 16] {
    *uuid.as_bytes()
}

fn blob_uuid(bytes: Vec<u8>, column: &str) -> rusqlite::Result<Uuid> {
    Uuid::from_slice(&bytes).map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, column.into(), rusqlite::types::Type::Blob)
    })
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let doc_id: Vec<u8> = row.get("doc_id")?;
    let group_id: Option<Vec<u8>> = row.get("group_id")?;
    let uploaded_by: Vec<u8> = row.get("uploaded_by")?;

    Ok(DocumentRecord {
        id: DocumentId::from_uuid(blob_uuid(doc_id, "doc_id")?),
        name: row.get("name")?,
        group_id: group_id
            .map(|b| blob_uuid(b, "group_id").map(GroupId::from_uuid))
            .transpose()?,
        size: row.get::<_, i64>("size")? as u64,
        storage_path: row.get("storage_path")?,
        uploaded_by: ActorId::from_uuid(blob_uuid(uploaded_by, "uploaded_by")?),
        created_at: row.get("created_at")?,
    })
}

fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentGroup> {
    let group_id: Vec<u8> = row.get("group_id")?;
    Ok(DocumentGroup {
        id: GroupId::from_uuid(blob_uuid(group_id, "group_id")?),
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_actor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Actor> {
    let actor_id: Vec<u8> = row.get("actor_id")?;
    let role_id: Vec<u8> = row.get("role_id")?;
    Ok(Actor {
        id: ActorId::from_uuid(blob_uuid(actor_id, "actor_id")?),
        username: row.get("username")?,
        credential_hash: row.get("credential_hash")?,
        locked: row.get::<_, i64>("locked")? != 0,
        role_id: RoleId::from_uuid(blob_uuid(role_id, "role_id")?),
    })
}

fn row_to_role(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Role, Vec<u8>)> {
    let role_id: Vec<u8> = row.get("role_id")?;
    let rules_cbor: Vec<u8> = row.get("rules")?;
    Ok((
        Role {
            id: RoleId::from_uuid(blob_uuid(role_id, "role_id")?),
            name: row.get("name")?,
            is_super: row.get::<_, i64>("is_super")? != 0,
            rules: Vec::new(),
        },
        rules_cbor,
    ))
}

fn decode_rules(cbor: &[u8]) -> Result<Vec<ScopeRule>> {
    if cbor.is_empty() {
        return Ok(Vec::new());
    }
    ciborium::from_reader(cbor).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode_rules(rules: &[ScopeRule]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(&rules, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ─────────────────────────────────────────────────────────────────────────
// DocumentStore
// ─────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, record: &DocumentRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (doc_id, name, group_id, size, storage_path, uploaded_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    uuid_blob(record.id.as_uuid()),
                    record.name,
                    record.group_id.map(|g| uuid_blob(g.as_uuid())),
                    record.size as i64,
                    record.storage_path,
                    uuid_blob(record.uploaded_by.as_uuid()),
                    record.created_at,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(record.id.to_string())
                } else {
                    StoreError::Database(e)
                }
            })?;
            Ok(())
        })
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT doc_id, name, group_id, size, storage_path, uploaded_by, created_at
                 FROM documents WHERE doc_id = ?1",
                params![uuid_blob(id.as_uuid())],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::Database)
        })
    }

    async fn list_documents(&self, group: Option<GroupId>) -> Result<Vec<DocumentRecord>> {
        self.with_conn(|conn| {
            let mut docs = Vec::new();
            match group {
                Some(group) => {
                    let mut stmt = conn.prepare(
                        "SELECT doc_id, name, group_id, size, storage_path, uploaded_by, created_at
                         FROM documents WHERE group_id = ?1 ORDER BY created_at",
                    )?;
                    let rows =
                        stmt.query_map(params![uuid_blob(group.as_uuid())], row_to_document)?;
                    for row in rows {
                        docs.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT doc_id, name, group_id, size, storage_path, uploaded_by, created_at
                         FROM documents ORDER BY created_at",
                    )?;
                    let rows = stmt.query_map([], row_to_document)?;
                    for row in rows {
                        docs.push(row?);
                    }
                }
            }
            Ok(docs)
        })
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM documents WHERE doc_id = ?1",
                params![uuid_blob(id.as_uuid())],
            )?;
            Ok(affected > 0)
        })
    }

    async fn insert_group(&self, group: &DocumentGroup) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO groups (group_id, name, created_at) VALUES (?1, ?2, ?3)",
                params![uuid_blob(group.id.as_uuid()), group.name, group.created_at],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(group.id.to_string())
                } else {
                    StoreError::Database(e)
                }
            })?;
            Ok(())
        })
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<DocumentGroup>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT group_id, name, created_at FROM groups WHERE group_id = ?1",
                params![uuid_blob(id.as_uuid())],
                row_to_group,
            )
            .optional()
            .map_err(StoreError::Database)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────
// RoleRepository
// ─────────────────────────────────────────────────────────────────────────

fn repo_err(e: StoreError) -> RbacError {
    RbacError::Repository(e.to_string())
}

#[async_trait]
impl RoleRepository for SqliteStore {
    async fn find_role(&self, id: RoleId) -> docvault_rbac::Result<Option<Role>> {
        let found = self
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT role_id, name, is_super, rules FROM roles WHERE role_id = ?1",
                    params![uuid_blob(id.as_uuid())],
                    row_to_role,
                )
                .optional()
                .map_err(StoreError::Database)
            })
            .map_err(repo_err)?;

        match found {
            Some((mut role, cbor)) => {
                role.rules = decode_rules(&cbor).map_err(repo_err)?;
                Ok(Some(role))
            }
            None => Ok(None),
        }
    }

    async fn find_actor(&self, id: ActorId) -> docvault_rbac::Result<Option<Actor>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT actor_id, username, credential_hash, locked, role_id
                 FROM actors WHERE actor_id = ?1",
                params![uuid_blob(id.as_uuid())],
                row_to_actor,
            )
            .optional()
            .map_err(StoreError::Database)
        })
        .map_err(repo_err)
    }

    async fn find_actor_by_username(&self, username: &str) -> docvault_rbac::Result<Option<Actor>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT actor_id, username, credential_hash, locked, role_id
                 FROM actors WHERE username = ?1",
                params![username],
                row_to_actor,
            )
            .optional()
            .map_err(StoreError::Database)
        })
        .map_err(repo_err)
    }

    async fn insert_role(&self, role: &Role) -> docvault_rbac::Result<()> {
        let rules = encode_rules(&role.rules).map_err(repo_err)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO roles (role_id, name, is_super, rules) VALUES (?1, ?2, ?3, ?4)",
                params![
                    uuid_blob(role.id.as_uuid()),
                    role.name,
                    role.is_super as i64,
                    rules,
                ],
            )?;
            Ok(())
        })
        .map_err(repo_err)
    }

    async fn insert_actor(&self, actor: &Actor) -> docvault_rbac::Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO actors (actor_id, username, credential_hash, locked, role_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    uuid_blob(actor.id.as_uuid()),
                    actor.username,
                    actor.credential_hash,
                    actor.locked as i64,
                    uuid_blob(actor.role_id.as_uuid()),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(actor.username.clone())
                } else {
                    StoreError::Database(e)
                }
            })?;
            Ok(())
        })
        .map_err(|e| match e {
            StoreError::Duplicate(username) => RbacError::DuplicateUsername(username),
            other => repo_err(other),
        })
    }

    async fn replace_rules(
        &self,
        role_id: RoleId,
        rules: Vec<ScopeRule>,
    ) -> docvault_rbac::Result<()> {
        let cbor = encode_rules(&rules).map_err(repo_err)?;
        let affected = self
            .with_conn(|conn| {
                // The rule set is one row value, so the swap is a single
                // atomic write: readers see the old blob or the new one.
                let affected = conn.execute(
                    "UPDATE roles SET rules = ?1 WHERE role_id = ?2",
                    params![cbor, uuid_blob(role_id.as_uuid())],
                )?;
                Ok(affected)
            })
            .map_err(repo_err)?;

        if affected == 0 {
            return Err(RbacError::RoleNotFound(role_id));
        }
        Ok(())
    }

    async fn replace_scope_rule(
        &self,
        role_id: RoleId,
        rule: ScopeRule,
    ) -> docvault_rbac::Result<()> {
        // Read-modify-write under the connection lock; the swap itself is
        // still a single row update.
        let result = self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT rules FROM roles WHERE role_id = ?1",
                    params![uuid_blob(role_id.as_uuid())],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            let Some(cbor) = found else {
                return Ok(None);
            };
            let mut rules = decode_rules(&cbor)?;
            match rules.iter_mut().find(|r| r.scope == rule.scope) {
                Some(existing) => *existing = rule,
                None => rules.push(rule),
            }
            let cbor = encode_rules(&rules)?;
            conn.execute(
                "UPDATE roles SET rules = ?1 WHERE role_id = ?2",
                params![cbor, uuid_blob(role_id.as_uuid())],
            )?;
            Ok(Some(()))
        });

        match result {
            Ok(Some(())) => Ok(()),
            Ok(None) => Err(RbacError::RoleNotFound(role_id)),
            Err(e) => Err(repo_err(e)),
        }
    }

    async fn set_actor_locked(&self, id: ActorId, locked: bool) -> docvault_rbac::Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE actors SET locked = ?1 WHERE actor_id = ?2",
                params![locked as i64, uuid_blob(id.as_uuid())],
            )?;
            Ok(())
        })
        .map_err(repo_err)
    }

    async fn list_roles(&self) -> docvault_rbac::Result<Vec<Role>> {
        let rows = self
            .with_conn(|conn| {
                let mut stmt =
                    conn.prepare("SELECT role_id, name, is_super, rules FROM roles ORDER BY name")?;
                let rows = stmt.query_map([], row_to_role)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .map_err(repo_err)?;

        let mut roles = Vec::with_capacity(rows.len());
        for (mut role, cbor) in rows {
            role.rules = decode_rules(&cbor).map_err(repo_err)?;
            roles.push(role);
        }
        Ok(roles)
    }

    async fn list_actors(&self) -> docvault_rbac::Result<Vec<Actor>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT actor_id, username, credential_hash, locked, role_id
                 FROM actors ORDER BY username",
            )?;
            let rows = stmt.query_map([], row_to_actor)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .map_err(repo_err)
    }
}
