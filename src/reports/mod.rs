//! Reports for pocket-ledger
//!
//! Reports are derived on demand from any snapshot of transactions.

pub mod spending;

pub use spending::{aggregate_expenses_by_category, CategorySpending, SpendingReport};
