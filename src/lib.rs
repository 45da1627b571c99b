// Safeguard — Library root
//
// Re-exports the record store, session lifecycle, and CLI modules.

pub mod cli;
pub mod error;
pub mod session;
pub mod store;

pub use error::{Result, SafeguardError};
pub use session::{Session, StoreConfig, StoreHandle};
pub use store::{Record, RecordFields, RecordPatch, StoreError};
