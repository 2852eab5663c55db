//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the reconciliation service.

pub mod ledger;
pub mod shell;

pub use ledger::{handle_ledger_command, LedgerCommands};
pub use shell::run_shell;
