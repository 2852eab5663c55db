//! pocket-ledger - a single-user income and expense ledger
//!
//! The crate keeps an ordered list of transactions with a running balance,
//! persists both to a key-value store after every change, and offers a
//! guarded reset with a one-level undo.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Money, transactions, the ledger and its reset backup
//! - `storage`: Key-value stores and the serialized save queue
//! - `services`: The reconciliation controller that keeps memory and storage in step
//! - `reports`: Spending aggregation by category
//! - `display`: Terminal formatting
//! - `cli`: Command handlers and the interactive shell
//!
//! # Example
//!
//! ```rust,ignore
//! use pocket_ledger::config::paths::LedgerPaths;
//! use pocket_ledger::services::ReconciliationController;
//! use pocket_ledger::storage::open_file_store;
//!
//! let paths = LedgerPaths::new()?;
//! let mut controller = ReconciliationController::new(open_file_store(&paths)?);
//! futures::executor::block_on(controller.start());
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

use std::sync::Once;

pub use error::{LedgerError, LedgerResult};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "POCKET_LOG";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber, logging to stderr.
///
/// The filter comes from `POCKET_LOG` and defaults to warnings only.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("pocket_ledger=warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
