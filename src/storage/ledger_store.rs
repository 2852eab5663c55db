//! Ledger persistence over a key-value store
//!
//! Two keys are used: `transactions` holds the JSON array of transaction
//! records and `balance` holds the balance as a decimal string. The stored
//! balance is a cached value only: on load it is recomputed from the
//! transactions, and a disagreeing stored value is reported and ignored.

use tracing::{debug, warn};

use super::kv::KeyValueStore;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Ledger, Money, Transaction};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const BALANCE_KEY: &str = "balance";

/// Loads and saves the ledger through any [`KeyValueStore`]
pub struct LedgerStore<S> {
    store: S,
}

impl<S: KeyValueStore> LedgerStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying key-value store
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Load the stored ledger
    ///
    /// A store that has never been written yields an empty ledger.
    pub async fn load(&self) -> LedgerResult<Ledger> {
        let raw_transactions = self.store.get(TRANSACTIONS_KEY).await?;
        let raw_balance = self.store.get(BALANCE_KEY).await?;

        let transactions: Vec<Transaction> = match raw_transactions {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                LedgerError::PersistenceFailure(format!("Stored transactions are unreadable: {}", e))
            })?,
            None => Vec::new(),
        };

        let ledger = Ledger::from_transactions(transactions)
            .map_err(|e| LedgerError::PersistenceFailure(format!("Stored transactions rejected: {}", e)))?;

        match raw_balance.as_deref().map(Money::parse) {
            Some(Ok(stored)) if stored != ledger.balance() => warn!(
                stored = %stored.to_decimal_string(),
                derived = %ledger.balance().to_decimal_string(),
                "stored balance disagrees with transactions; using derived balance"
            ),
            Some(Err(e)) => warn!(error = %e, "stored balance is unreadable; using derived balance"),
            _ => {}
        }

        debug!(
            transactions = ledger.len(),
            balance = %ledger.balance().to_decimal_string(),
            "loaded ledger"
        );
        Ok(ledger)
    }

    /// Save transactions and balance as one batch
    pub async fn save(&self, transactions: &[Transaction], balance: Money) -> LedgerResult<()> {
        let json = serde_json::to_string(transactions).map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to serialize transactions: {}", e))
        })?;

        self.store
            .set_many(vec![
                (TRANSACTIONS_KEY.to_string(), json),
                (BALANCE_KEY.to_string(), balance.to_decimal_string()),
            ])
            .await
    }
}
