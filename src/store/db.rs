// Safeguard — SQLite Database Management
//
// Opens the backing SQLite file and brings its schema up to the current
// version. The version lives in `PRAGMA user_version`; each migration runs
// inside its own transaction together with the version bump.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};

use super::StoreError;

/// Schema version this build writes and understands.
pub const SCHEMA_VERSION: i64 = 1;

/// Migration `n` (1-based) upgrades a store from version `n - 1` to `n`.
const MIGRATIONS: &[&str] = &["
    CREATE TABLE IF NOT EXISTS records (
        id          TEXT PRIMARY KEY,
        service     TEXT NOT NULL,
        username    TEXT NOT NULL,
        secret      TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_service
        ON records(service);

    CREATE INDEX IF NOT EXISTS idx_records_updated_at
        ON records(updated_at);
    "];

/// Wrapper around the single SQLite connection backing the record table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::Connection)?;
        conn.busy_timeout(busy_timeout)
            .map_err(StoreError::Connection)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(StoreError::Connection)?;

        let mut db = Self { conn };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Record store opened");
        Ok(db)
    }

    /// Open a private in-memory database. Its contents vanish with the handle.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Connection)?;
        let mut db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current on-disk schema version.
    pub fn schema_version(&self) -> Result<i64, StoreError> {
        self.conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(StoreError::Connection)
    }

    /// Apply every migration above the stored version. Idempotent.
    fn run_migrations(&mut self) -> Result<(), StoreError> {
        let found = self.schema_version()?;
        if found > SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        for (index, sql) in MIGRATIONS.iter().enumerate().skip(found.max(0) as usize) {
            let version = index as i64 + 1;
            let tx = self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::Connection)?;
            tx.execute_batch(sql).map_err(StoreError::Connection)?;
            tx.pragma_update(None, "user_version", version)
                .map_err(StoreError::Connection)?;
            tx.commit().map_err(StoreError::Connection)?;

            tracing::debug!(version, "Schema migration applied");
        }

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
