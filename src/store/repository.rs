// Safeguard — Record Store Repository
//
// Implements the atomic CRUD, listing and search operations on the record
// table. Every mutation runs in a single IMMEDIATE transaction, so Update's
// read-merge-write cannot interleave with another writer.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::db::Database;
use super::models::{Record, RecordFields, RecordPatch};
use super::StoreError;

const SELECT_RECORD: &str =
    "SELECT id, service, username, secret, created_at, updated_at FROM records";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over record storage operations.
pub trait RecordStore {
    /// Insert a new record. The store assigns `id`, `created_at` and `updated_at`.
    fn add(&self, fields: RecordFields) -> Result<Record, StoreError>;

    /// Get a single record by ID.
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Merge `patch` over the stored record and refresh `updated_at`.
    /// Returns `None` without side effects when `id` does not exist.
    fn update(&self, id: &str, patch: RecordPatch) -> Result<Option<Record>, StoreError>;

    /// Delete a record by ID. Returns true if it existed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Every record, most recently modified first.
    fn list_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Records whose service or username contains `query`, case-insensitively,
    /// in `list_all` order. A blank query returns everything.
    fn search(&self, query: &str) -> Result<Vec<Record>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteRecordStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteRecordStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a record row from the database.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
        let id: String = row.get(0)?;
        let service: String = row.get(1)?;
        let username: String = row.get(2)?;
        let secret: String = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        let created_at = parse_timestamp(4, &created_at_str)?;
        let updated_at = parse_timestamp(5, &updated_at_str)?;

        Ok(Record::new(
            id, service, username, secret, created_at, updated_at,
        ))
    }

    /// Run `op` inside one IMMEDIATE transaction. Nothing is committed if
    /// `op` or the commit fails.
    fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let tx = Transaction::new_unchecked(self.db.conn(), TransactionBehavior::Immediate)
            .map_err(StoreError::Write)?;
        let value = op(&tx).map_err(StoreError::Write)?;
        tx.commit().map_err(StoreError::Write)?;
        Ok(value)
    }
}

impl<'a> RecordStore for SqliteRecordStore<'a> {
    fn add(&self, fields: RecordFields) -> Result<Record, StoreError> {
        let id = Uuid::new_v4().to_string();

        let record = self.write(|tx| {
            let now = next_stamp(tx)?;
            let stamp = format_timestamp(&now);

            tx.execute(
                "INSERT INTO records
                    (id, service, username, secret, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    fields.service,
                    fields.username,
                    fields.secret,
                    stamp,
                    stamp,
                ],
            )?;

            Ok(Record::new(
                id,
                fields.service,
                fields.username,
                fields.secret,
                now,
                now,
            ))
        })?;

        tracing::info!(
            record_id = %record.id,
            service = %record.service,
            "Record stored"
        );

        Ok(record)
    }

    fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.db
            .conn()
            .query_row(
                &format!("{SELECT_RECORD} WHERE id = ?1"),
                params![id],
                Self::row_to_record,
            )
            .optional()
            .map_err(StoreError::Read)
    }

    fn update(&self, id: &str, patch: RecordPatch) -> Result<Option<Record>, StoreError> {
        let updated = self.write(|tx| {
            let existing = tx
                .query_row(
                    &format!("{SELECT_RECORD} WHERE id = ?1"),
                    params![id],
                    Self::row_to_record,
                )
                .optional()?;

            let Some(mut record) = existing else {
                return Ok(None);
            };

            patch.apply(&mut record);
            // The table maximum includes this row, so the stamp strictly advances.
            record.updated_at = next_stamp(tx)?;

            tx.execute(
                "UPDATE records
                    SET service = ?2, username = ?3, secret = ?4, updated_at = ?5
                  WHERE id = ?1",
                params![
                    record.id,
                    record.service,
                    record.username,
                    record.secret(),
                    format_timestamp(&record.updated_at),
                ],
            )?;

            Ok(Some(record))
        })?;

        match &updated {
            Some(record) => tracing::info!(
                record_id = %record.id,
                service = %record.service,
                "Record updated"
            ),
            None => tracing::debug!(record_id = %id, "Update target not found"),
        }

        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let affected =
            self.write(|tx| tx.execute("DELETE FROM records WHERE id = ?1", params![id]))?;

        if affected > 0 {
            tracing::info!(record_id = %id, "Record deleted");
        }

        Ok(affected > 0)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        // Walks idx_records_updated_at backwards; rowid breaks ties by insertion recency.
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!(
                "{SELECT_RECORD} ORDER BY updated_at DESC, rowid DESC"
            ))
            .map_err(StoreError::Read)?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(StoreError::Read)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Read)
    }

    fn search(&self, query: &str) -> Result<Vec<Record>, StoreError> {
        let all = self.list_all()?;
        if query.trim().is_empty() {
            return Ok(all);
        }

        let needle = query.to_lowercase();
        Ok(all.into_iter().filter(|r| r.matches(&needle)).collect())
    }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Fixed-width RFC 3339, so text order in the index is chronological order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// The wall clock, bumped past the newest `updated_at` already in the table.
fn next_stamp(conn: &Connection) -> rusqlite::Result<DateTime<Utc>> {
    let now = Utc::now();
    let latest: Option<String> =
        conn.query_row("SELECT MAX(updated_at) FROM records", [], |row| row.get(0))?;

    match latest {
        Some(raw) => {
            let floor = parse_timestamp(0, &raw)? + chrono::Duration::nanoseconds(1);
            Ok(now.max(floor))
        }
        None => Ok(now),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
