//! Transaction identifiers
//!
//! Ids are opaque strings. New ids are time-ordered UUIDv7 text, but any
//! string read back from storage is accepted as-is, so ledgers written by
//! other tools (e.g. millisecond timestamps) keep their ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new unique, creation-time ordered ID
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing opaque identifier
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for tables
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| TransactionId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_ids_are_creation_ordered() {
        let first = TransactionId::new();
        let second = TransactionId::new();
        assert!(first < second);
    }

    #[test]
    fn test_foreign_id_preserved() {
        let id: TransactionId = serde_json::from_str("\"1718000000000\"").unwrap();
        assert_eq!(id.as_str(), "1718000000000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1718000000000\"");
    }

    #[test]
    fn test_short() {
        assert_eq!(TransactionId::from_string("abc").short(), "abc");
        assert_eq!(TransactionId::from_string("0123456789").short(), "01234567");
    }
}
