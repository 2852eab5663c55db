//! Serialized save queue
//!
//! Every save takes a ticket at the point the ledger was mutated. Saves run
//! one at a time behind an async mutex, and a save whose ticket is older than
//! the last one written is dropped, so the store always ends up holding the
//! causally latest snapshot even if saves complete out of order.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::lock::Mutex;
use tracing::{debug, warn};

use super::kv::KeyValueStore;
use super::ledger_store::LedgerStore;
use crate::error::LedgerResult;
use crate::models::{Ledger, Money, Transaction};

/// Causal position of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// What happened to a submitted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written to the store
    Written,
    /// A newer snapshot had already been written; this one was dropped
    Superseded,
}

struct QueueState<S> {
    store: LedgerStore<S>,
    last_written: Option<Ticket>,
}

pub struct SaveQueue<S> {
    state: Mutex<QueueState<S>>,
    issued: AtomicU64,
}

impl<S: KeyValueStore> SaveQueue<S> {
    pub fn new(store: LedgerStore<S>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                store,
                last_written: None,
            }),
            issued: AtomicU64::new(0),
        }
    }

    /// Take the next ticket; call this when the snapshot is captured
    pub fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Load through the queue so a load never overlaps a write
    pub async fn load(&self) -> LedgerResult<Ledger> {
        let state = self.state.lock().await;
        state.store.load().await
    }

    /// Write a snapshot unless a newer one has already been written
    ///
    /// A failed write leaves the last written ticket unchanged, so a later
    /// snapshot can still replace whatever the store holds.
    pub async fn submit(
        &self,
        ticket: Ticket,
        transactions: Vec<Transaction>,
        balance: Money,
    ) -> LedgerResult<SaveOutcome> {
        let mut state = self.state.lock().await;

        if state.last_written.is_some_and(|last| ticket <= last) {
            debug!(ticket = ticket.0, "dropping superseded snapshot");
            return Ok(SaveOutcome::Superseded);
        }

        match state.store.save(&transactions, balance).await {
            Ok(()) => {
                state.last_written = Some(ticket);
                debug!(ticket = ticket.0, transactions = transactions.len(), "snapshot written");
                Ok(SaveOutcome::Written)
            }
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "snapshot write failed");
                Err(e)
            }
        }
    }

    /// Run `f` against the underlying store
    pub async fn with_store<R>(&self, f: impl FnOnce(&LedgerStore<S>) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.store)
    }
}
