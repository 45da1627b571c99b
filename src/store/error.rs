// Safeguard — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot open record store: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Cannot create record store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported schema version {found} (this build supports up to {supported})")]
    UnsupportedSchema { found: i64, supported: i64 },

    #[error("Read failed: {0}")]
    Read(#[source] rusqlite::Error),

    #[error("Write failed: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// True when the store could not be opened at all. The caller may retry
    /// `ensure_ready` later.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::Io(_) | StoreError::UnsupportedSchema { .. }
        )
    }
}
