//! Storage layer for pocket-ledger
//!
//! An async key-value capability ([`KeyValueStore`]) with file and memory
//! implementations, the two-key ledger encoding on top of it
//! ([`LedgerStore`]), and the serialized [`SaveQueue`] used by the controller.

pub mod file_io;
pub mod kv;
pub mod ledger_store;
pub mod queue;

pub use file_io::{read_json, write_json_atomic};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use ledger_store::{LedgerStore, BALANCE_KEY, TRANSACTIONS_KEY};
pub use queue::{SaveOutcome, SaveQueue, Ticket};

use crate::config::paths::LedgerPaths;
use crate::error::LedgerError;

/// Open the file-backed ledger store under the configured data directory
pub fn open_file_store(paths: &LedgerPaths) -> Result<LedgerStore<FileStore>, LedgerError> {
    paths.ensure_directories()?;
    Ok(LedgerStore::new(FileStore::new(paths.store_file())))
}
