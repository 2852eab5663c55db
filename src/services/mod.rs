//! Service layer for pocket-ledger
//!
//! The service layer orchestrates the ledger model and the storage layer.

pub mod reconciliation;

pub use reconciliation::{
    ControllerState, LoadStatus, Mutation, Persistence, ReconciliationController,
};
