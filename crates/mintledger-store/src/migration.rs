//! Database schema migrations for SQLite.
//!
//! Versioned and applied in order inside one transaction. Each version
//! transforms the schema from N to N+1.

use rusqlite::{Connection, TransactionBehavior};

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: running it against an up-to-date database does nothing.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Holding the write lock throughout keeps two openers of a fresh file
    // from both applying the same version.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = tx.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    for version in (current + 1)..=CURRENT_VERSION {
        apply_migration(&tx, version)?;

        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, now_millis()],
        )?;
    }

    tx.commit()?;
    if current < CURRENT_VERSION {
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated ledger schema");
    }
    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: mints and token accounts.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE mints (
            mint_address BLOB PRIMARY KEY,    -- 32 bytes
            authority BLOB NOT NULL,          -- 32 bytes, Ed25519 public key
            record BLOB NOT NULL,             -- canonical CBOR of the mint record
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE token_accounts (
            account_address BLOB PRIMARY KEY, -- 32 bytes, derived from (owner, mint)
            owner BLOB NOT NULL,              -- 32 bytes
            mint BLOB NOT NULL REFERENCES mints(mint_address),
            record BLOB NOT NULL,             -- canonical CBOR of the account record
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            UNIQUE(owner, mint)
        );

        CREATE INDEX idx_accounts_mint ON token_accounts(mint);
        CREATE INDEX idx_accounts_owner ON token_accounts(owner);
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"mints".to_string()));
        assert!(tables.contains(&"token_accounts".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            rusqlite::params![CURRENT_VERSION + 1],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }

    #[test]
    fn test_unique_owner_mint_pair() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO mints VALUES (x'01', x'02', x'', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO token_accounts VALUES (x'aa', x'03', x'01', x'', 0, 0)",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO token_accounts VALUES (x'bb', x'03', x'01', x'', 0, 0)",
            [],
        );
        assert!(dup.is_err());
    }
}
