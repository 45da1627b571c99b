// Safeguard — Store configuration
//
// Where the record store lives and how the connection is tuned. Built
// explicitly by the caller and handed to `Session::new`.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::{Database, StoreError};

/// Directory name under the platform data dir.
pub const APP_DIR: &str = "safeguard";

/// Database file name inside `APP_DIR`.
pub const DB_FILE: &str = "safeguard.db";

/// How long a writer waits on a lock held by another connection.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A SQLite file, created on first open.
    File(PathBuf),
    /// A private in-memory table that lives as long as its session.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// `<data dir>/safeguard/safeguard.db`, or relative to the working
    /// directory when the platform has no data dir.
    pub fn default_path() -> PathBuf {
        let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join(APP_DIR).join(DB_FILE)
    }

    /// Open the configured database and bring its schema up to date.
    pub(crate) fn open(&self) -> Result<Database, StoreError> {
        match &self.location {
            StoreLocation::File(path) => Database::open(path, self.busy_timeout),
            StoreLocation::Memory => Database::open_in_memory(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::at(Self::default_path())
    }
}
