// Safeguard — Store Module
//
// Durable password record table on SQLite, with an `updated_at` index for
// most-recent-first listing and a `service` index for lookups.

mod db;
mod error;
mod models;
mod repository;

pub use db::{Database, SCHEMA_VERSION};
pub use error::StoreError;
pub use models::{Record, RecordFields, RecordPatch, RecordSummary};
pub use repository::{RecordStore, SqliteRecordStore};
