//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use docvault_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Document metadata; encrypted blobs live on the filesystem
        CREATE TABLE documents (
            doc_id BLOB PRIMARY KEY,          -- 16 bytes, UUID
            name TEXT NOT NULL,               -- original file name
            group_id BLOB,                    -- 16 bytes, nullable
            size INTEGER NOT NULL,            -- plaintext length in bytes
            storage_path TEXT NOT NULL,       -- blob path relative to storage root
            uploaded_by BLOB NOT NULL,        -- 16 bytes, actor UUID
            created_at INTEGER NOT NULL       -- Unix ms
        );

        -- Document groups
        CREATE TABLE groups (
            group_id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- Actors
        CREATE TABLE actors (
            actor_id BLOB PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            credential_hash TEXT NOT NULL,    -- Argon2 PHC string
            locked INTEGER NOT NULL DEFAULT 0,
            role_id BLOB NOT NULL
        );

        -- Roles; the rule set is one CBOR blob so replacement is a single write
        CREATE TABLE roles (
            role_id BLOB PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            is_super INTEGER NOT NULL DEFAULT 0,
            rules BLOB NOT NULL               -- CBOR array of scope rules
        );

        -- Indexes for common queries
        CREATE INDEX idx_documents_group ON documents(group_id);
        CREATE INDEX idx_documents_created ON documents(created_at);
        CREATE INDEX idx_actors_username ON actors(username);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        // Verify tables exist
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"groups".to_string()));
        assert!(tables.contains(&"actors".to_string()));
        assert!(tables.contains(&"roles".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap(); // Should not error
        migrate(&mut conn).unwrap(); // Still should not error

        // Verify version is 1
        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }
}
