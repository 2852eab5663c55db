//! Reconciliation service
//!
//! Keeps the in-memory ledger and the durable store consistent. The
//! controller owns the session state (the live ledger, the single backup
//! slot and the pending-reset flag) and is the only thing that mutates it.
//!
//! Lifecycle: a controller starts in [`ControllerState::Loading`]; `start()`
//! loads the stored ledger and moves it to [`ControllerState::Ready`].
//! Operations called before that are rejected with `NotReady`.
//!
//! Every mutation is saved before the call returns. A failed save is reported
//! in the returned [`Mutation`] and never undoes the in-memory change. If the
//! initial load fails the session runs in session-only mode: nothing is
//! written, so an unreadable store is left exactly as it was found.

use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Backup, Ledger, Money, Transaction, TransactionKind};
use crate::reports::SpendingReport;
use crate::storage::{KeyValueStore, LedgerStore, SaveQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Loading,
    Ready,
}

/// Result of the initial load
#[derive(Debug)]
pub enum LoadStatus {
    /// Stored state loaded (possibly empty on first run)
    Loaded,
    /// The store could not be read; the session continues without persistence
    SessionOnly(LedgerError),
}

/// Whether a mutation reached the durable store
#[derive(Debug)]
pub enum Persistence {
    Saved,
    /// The save was rejected; in-memory state is still authoritative
    Failed(LedgerError),
    /// Persistence is disabled for this session
    SessionOnly,
}

/// A completed mutation and its persistence status
#[derive(Debug)]
pub struct Mutation<T> {
    pub value: T,
    pub persistence: Persistence,
}

impl<T> Mutation<T> {
    pub fn is_durable(&self) -> bool {
        matches!(self.persistence, Persistence::Saved)
    }

    /// Human readable warning when the change was not persisted
    pub fn warning(&self) -> Option<String> {
        match &self.persistence {
            Persistence::Saved => None,
            Persistence::Failed(e) => Some(format!("change kept for this session only: {}", e)),
            Persistence::SessionOnly => {
                Some("change kept for this session only: storage is unavailable".to_string())
            }
        }
    }
}

pub struct ReconciliationController<S> {
    queue: SaveQueue<S>,
    state: ControllerState,
    ledger: Ledger,
    backup: Option<Backup>,
    reset_pending: bool,
    session_only: bool,
}

impl<S: KeyValueStore> ReconciliationController<S> {
    pub fn new(store: LedgerStore<S>) -> Self {
        Self {
            queue: SaveQueue::new(store),
            state: ControllerState::Loading,
            ledger: Ledger::new(),
            backup: None,
            reset_pending: false,
            session_only: false,
        }
    }

    /// Load the stored ledger and become ready
    ///
    /// Calling this again once ready is a no-op.
    pub async fn start(&mut self) -> LoadStatus {
        if self.state == ControllerState::Ready {
            return LoadStatus::Loaded;
        }

        let status = match self.queue.load().await {
            Ok(ledger) => {
                info!(
                    transactions = ledger.len(),
                    balance = %ledger.balance().to_decimal_string(),
                    "ledger loaded"
                );
                self.ledger = ledger;
                LoadStatus::Loaded
            }
            Err(e) => {
                warn!(error = %e, "ledger load failed; continuing without persistence");
                self.session_only = true;
                LoadStatus::SessionOnly(e)
            }
        };
        self.state = ControllerState::Ready;
        status
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_session_only(&self) -> bool {
        self.session_only
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    pub fn balance(&self) -> Money {
        self.ledger.balance()
    }

    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Spending by category for the current ledger
    pub fn spending_report(&self) -> LedgerResult<SpendingReport> {
        SpendingReport::generate(self.ledger.transactions())
    }

    /// Append a transaction and save the ledger
    ///
    /// Invalid input is returned as an error with no mutation and no save.
    pub async fn add_transaction(
        &mut self,
        kind: TransactionKind,
        amount: &str,
        category: &str,
    ) -> LedgerResult<Mutation<Transaction>> {
        self.ensure_ready()?;
        let txn = self.ledger.append(kind, amount, category)?;
        info!(
            id = %txn.id,
            kind = %txn.kind,
            amount = %txn.amount.to_decimal_string(),
            category = %txn.category,
            "transaction added"
        );

        let persistence = self.persist().await;
        Ok(Mutation {
            value: txn,
            persistence,
        })
    }

    /// Open the confirmation gate for a destructive reset
    pub fn request_reset(&mut self) -> LedgerResult<()> {
        self.ensure_ready()?;
        self.reset_pending = true;
        Ok(())
    }

    /// Close the confirmation gate without touching the ledger
    pub fn cancel_reset(&mut self) -> LedgerResult<()> {
        self.ensure_ready()?;
        self.reset_pending = false;
        Ok(())
    }

    /// Reset the ledger, keeping the previous state as the undo backup
    ///
    /// Requires a prior `request_reset`. Any backup not yet undone is
    /// discarded.
    pub async fn confirm_reset(&mut self) -> LedgerResult<Mutation<()>> {
        self.ensure_ready()?;
        if !self.reset_pending {
            return Err(LedgerError::InvalidInput(
                "reset must be requested before it can be confirmed".into(),
            ));
        }
        self.reset_pending = false;

        let backup = self.ledger.reset();
        if self.backup.is_some() {
            info!("previous reset backup discarded");
        }
        info!(
            transactions = backup.transactions().len(),
            balance = %backup.balance().to_decimal_string(),
            "ledger reset"
        );
        self.backup = Some(backup);

        let persistence = self.persist().await;
        Ok(Mutation {
            value: (),
            persistence,
        })
    }

    /// Restore the ledger captured by the last reset
    pub async fn undo_reset(&mut self) -> LedgerResult<Mutation<()>> {
        self.ensure_ready()?;
        self.ledger.restore(self.backup.take())?;
        info!(
            transactions = self.ledger.len(),
            balance = %self.ledger.balance().to_decimal_string(),
            "reset undone"
        );

        let persistence = self.persist().await;
        Ok(Mutation {
            value: (),
            persistence,
        })
    }

    fn ensure_ready(&self) -> LedgerResult<()> {
        match self.state {
            ControllerState::Ready => Ok(()),
            ControllerState::Loading => Err(LedgerError::NotReady),
        }
    }

    async fn persist(&self) -> Persistence {
        if self.session_only {
            return Persistence::SessionOnly;
        }

        let ticket = self.queue.ticket();
        match self
            .queue
            .submit(
                ticket,
                self.ledger.transactions().to_vec(),
                self.ledger.balance(),
            )
            .await
        {
            Ok(_) => Persistence::Saved,
            Err(e) => {
                warn!(error = %e, "save failed; in-memory ledger kept");
                Persistence::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, BALANCE_KEY, TRANSACTIONS_KEY};
    use futures::executor::block_on;
    use std::sync::Arc;

    type Controller = ReconciliationController<Arc<MemoryStore>>;

    fn controller_with(store: &Arc<MemoryStore>) -> Controller {
        ReconciliationController::new(LedgerStore::new(Arc::clone(store)))
    }

    fn ready_controller() -> (Arc<MemoryStore>, Controller) {
        let store = Arc::new(MemoryStore::new());
        let mut controller = controller_with(&store);
        assert!(matches!(block_on(controller.start()), LoadStatus::Loaded));
        (store, controller)
    }

    fn add(controller: &mut Controller, kind: TransactionKind, amount: &str, category: &str) {
        let mutation = block_on(controller.add_transaction(kind, amount, category)).unwrap();
        assert!(mutation.is_durable());
    }

    fn reset(controller: &mut Controller) {
        controller.request_reset().unwrap();
        assert!(block_on(controller.confirm_reset()).unwrap().is_durable());
    }

    #[test]
    fn test_operations_rejected_before_start() {
        let store = Arc::new(MemoryStore::new());
        let mut controller = controller_with(&store);

        assert_eq!(controller.state(), ControllerState::Loading);
        assert!(matches!(
            block_on(controller.add_transaction(TransactionKind::Income, "10", "Salary")),
            Err(LedgerError::NotReady)
        ));
        assert!(matches!(controller.request_reset(), Err(LedgerError::NotReady)));
        assert!(matches!(controller.cancel_reset(), Err(LedgerError::NotReady)));
        assert!(matches!(block_on(controller.confirm_reset()), Err(LedgerError::NotReady)));
        assert!(matches!(block_on(controller.undo_reset()), Err(LedgerError::NotReady)));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_first_run_starts_empty() {
        let (_store, controller) = ready_controller();
        assert_eq!(controller.state(), ControllerState::Ready);
        assert!(controller.transactions().is_empty());
        assert!(controller.balance().is_zero());
        assert!(!controller.is_session_only());
    }

    #[test]
    fn test_add_transaction_saves() {
        let (store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "1000", "Salary");
        add(&mut controller, TransactionKind::Expense, "45.50", "Internet");

        assert_eq!(controller.balance().cents(), 95_450);
        assert_eq!(store.raw(BALANCE_KEY), Some("954.50".into()));
    }

    #[test]
    fn test_invalid_input_does_not_mutate_or_save() {
        let (store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "10", "Salary");
        let writes = store.write_count();

        let err = block_on(controller.add_transaction(TransactionKind::Expense, "ten", "Rent")).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(controller.transactions().len(), 1);
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_restart_durability() {
        let (store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Expense, "20", "Water");
        let expected = controller.ledger().clone();
        drop(controller);

        let mut restarted = controller_with(&store);
        assert!(matches!(block_on(restarted.start()), LoadStatus::Loaded));
        assert_eq!(restarted.ledger(), &expected);
        assert_eq!(restarted.balance().cents(), -2000);
    }

    #[test]
    fn test_confirm_requires_request() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "10", "Salary");

        let err = block_on(controller.confirm_reset()).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(controller.transactions().len(), 1);

        controller.request_reset().unwrap();
        controller.cancel_reset().unwrap();
        assert!(!controller.is_reset_pending());
        assert!(block_on(controller.confirm_reset()).is_err());
        assert_eq!(controller.transactions().len(), 1);
    }

    #[test]
    fn test_reset_then_undo_restores_exact_state() {
        let (store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "1000", "Salary");
        add(&mut controller, TransactionKind::Expense, "300", "Rent");
        let before = controller.ledger().clone();

        reset(&mut controller);
        assert!(controller.transactions().is_empty());
        assert!(controller.balance().is_zero());
        assert!(controller.has_backup());
        assert_eq!(store.raw(TRANSACTIONS_KEY), Some("[]".into()));
        assert_eq!(store.raw(BALANCE_KEY), Some("0.00".into()));

        assert!(block_on(controller.undo_reset()).unwrap().is_durable());
        assert_eq!(controller.ledger(), &before);
        assert!(!controller.has_backup());
        assert_eq!(store.raw(BALANCE_KEY), Some("700.00".into()));
    }

    #[test]
    fn test_reset_undo_of_empty_ledger() {
        let (_store, mut controller) = ready_controller();
        reset(&mut controller);
        block_on(controller.undo_reset()).unwrap();
        assert_eq!(controller.ledger(), &Ledger::new());
    }

    #[test]
    fn test_undo_without_backup() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "10", "Salary");
        assert!(matches!(block_on(controller.undo_reset()), Err(LedgerError::NoBackup)));
        assert_eq!(controller.transactions().len(), 1);
    }

    #[test]
    fn test_undo_only_once() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "10", "Salary");
        reset(&mut controller);
        block_on(controller.undo_reset()).unwrap();
        assert!(matches!(block_on(controller.undo_reset()), Err(LedgerError::NoBackup)));
        assert_eq!(controller.transactions().len(), 1);
    }

    #[test]
    fn test_second_reset_discards_first_backup() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "100", "Salary");
        reset(&mut controller);

        add(&mut controller, TransactionKind::Expense, "5", "Gym");
        let second_snapshot = controller.ledger().clone();
        reset(&mut controller);

        block_on(controller.undo_reset()).unwrap();
        assert_eq!(controller.ledger(), &second_snapshot);
        assert_eq!(controller.balance().cents(), -500);
    }

    #[test]
    fn test_back_to_back_resets_leave_empty_backup() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "100", "Salary");
        reset(&mut controller);
        reset(&mut controller);

        block_on(controller.undo_reset()).unwrap();
        assert!(controller.transactions().is_empty());
        assert!(controller.balance().is_zero());
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let (store, mut controller) = ready_controller();
        store.set_fail_writes(true);

        let mutation =
            block_on(controller.add_transaction(TransactionKind::Income, "10", "Salary")).unwrap();
        assert!(matches!(mutation.persistence, Persistence::Failed(ref e) if e.is_persistence()));
        assert!(mutation.warning().is_some());
        assert_eq!(controller.balance().cents(), 1000);

        store.set_fail_writes(false);
        add(&mut controller, TransactionKind::Income, "5", "Bonus");
        assert_eq!(store.raw(BALANCE_KEY), Some("15.00".into()));
    }

    #[test]
    fn test_load_failure_runs_session_only() {
        let store = Arc::new(MemoryStore::with_entries([(TRANSACTIONS_KEY, "not json")]));
        let mut controller = controller_with(&store);

        assert!(matches!(block_on(controller.start()), LoadStatus::SessionOnly(_)));
        assert_eq!(controller.state(), ControllerState::Ready);
        assert!(controller.is_session_only());

        let mutation =
            block_on(controller.add_transaction(TransactionKind::Income, "10", "Salary")).unwrap();
        assert!(matches!(mutation.persistence, Persistence::SessionOnly));
        assert_eq!(controller.balance().cents(), 1000);
        assert_eq!(store.raw(TRANSACTIONS_KEY), Some("not json".into()));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Income, "10", "Salary");
        assert!(matches!(block_on(controller.start()), LoadStatus::Loaded));
        assert_eq!(controller.transactions().len(), 1);
    }

    #[test]
    fn test_spending_report_reflects_ledger() {
        let (_store, mut controller) = ready_controller();
        add(&mut controller, TransactionKind::Expense, "50", "Rent");
        add(&mut controller, TransactionKind::Income, "1000", "Salary");
        add(&mut controller, TransactionKind::Expense, "20", "Rent");

        let report = controller.spending_report().unwrap();
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].total.cents(), 7000);
    }

    #[test]
    fn test_spending_report_overflow_is_reported_not_fatal() {
        let (_store, mut controller) = ready_controller();
        let max = Money::from_cents(i64::MAX).to_decimal_string();
        for kind in [
            TransactionKind::Income,
            TransactionKind::Expense,
            TransactionKind::Income,
            TransactionKind::Expense,
        ] {
            add(&mut controller, kind, &max, "Rent");
        }

        assert!(controller.balance().is_zero());
        assert!(controller.spending_report().unwrap_err().is_invalid_input());
        assert_eq!(controller.transactions().len(), 4);
    }
}
