//! Core data models for pocket-ledger
//!
//! This module contains the data structures of the ledger domain:
//! money amounts, transactions, the ledger itself and the category catalog.

pub mod category;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod transaction;

pub use category::CategoryCatalog;
pub use ids::TransactionId;
pub use ledger::{Backup, Ledger};
pub use money::{Money, MoneyParseError};
pub use transaction::{Transaction, TransactionKind};
