// Safeguard — Session Module
//
// One lazily opened, schema-current connection per session, plus async
// wrappers over every record store operation.

mod config;
mod lifecycle;

pub use config::{StoreConfig, StoreLocation, APP_DIR, DB_FILE, DEFAULT_BUSY_TIMEOUT};
pub use lifecycle::{Session, StoreHandle};
