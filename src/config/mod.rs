//! Configuration module for pocket-ledger
//!
//! - Path resolution (environment override or platform config directory)
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::Settings;
