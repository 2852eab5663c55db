//! Custom error types for pocket-ledger
//!
//! This module defines the error hierarchy for the ledger using thiserror.
//! None of these errors is fatal: invalid input and missing backups are
//! rejected locally, persistence failures degrade to session-only operation.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed amount or category; the operation was rejected without mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Undo requested with nothing to restore
    #[error("No backup available to restore")]
    NoBackup,

    /// Operation attempted before the stored ledger finished loading
    #[error("Ledger is not ready: stored state has not been loaded yet")]
    NotReady,

    /// The durable store rejected a load or save
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl LedgerError {
    /// Create an "invalid input" error for a rejected amount
    pub fn invalid_amount(input: impl AsRef<str>) -> Self {
        Self::InvalidInput(format!("'{}' is not a valid amount", input.as_ref()))
    }

    /// Create an "invalid input" error for an empty category
    pub fn empty_category() -> Self {
        Self::InvalidInput("category must not be empty".into())
    }

    /// Check if this is an input validation error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a persistence failure
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
