//! Ledger model
//!
//! The ordered list of transactions plus the running balance. The balance is
//! maintained incrementally on every append and only recomputed by summation
//! in [`Ledger::verify`] and when seeding from stored transactions.

use std::mem;

use tracing::debug;

use super::money::Money;
use super::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, LedgerResult};

/// The single retained pre-reset snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    transactions: Vec<Transaction>,
    balance: Money,
}

impl Backup {
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balance(&self) -> Money {
        self.balance
    }
}

/// Transactions in insertion order with their derived balance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    balance: Money,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from stored transactions, deriving the balance from them
    ///
    /// Stored amounts are normalised to their absolute value so that older
    /// records with a sign cannot break the balance invariant.
    pub fn from_transactions(mut transactions: Vec<Transaction>) -> LedgerResult<Self> {
        for txn in &mut transactions {
            txn.amount = txn
                .amount
                .checked_abs()
                .ok_or_else(|| LedgerError::invalid_amount(txn.amount.to_decimal_string()))?;
        }
        let balance = Self::sum_signed(&transactions).ok_or_else(|| {
            LedgerError::InvalidInput("stored transactions overflow the balance".into())
        })?;
        Ok(Self {
            transactions,
            balance,
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction from user-supplied amount text
    ///
    /// Negative amounts are stored as their absolute value. Fails with
    /// `InvalidInput` when the amount is not a finite number or the category
    /// is blank; the ledger is untouched on failure.
    pub fn append(
        &mut self,
        kind: TransactionKind,
        amount: &str,
        category: &str,
    ) -> LedgerResult<Transaction> {
        let amount = Money::parse(amount).map_err(|_| LedgerError::invalid_amount(amount.trim()))?;
        self.append_amount(kind, amount, category)
    }

    /// Append a transaction with an already parsed amount
    pub fn append_amount(
        &mut self,
        kind: TransactionKind,
        amount: Money,
        category: &str,
    ) -> LedgerResult<Transaction> {
        let txn = Transaction::new(kind, amount, category)?;
        let balance = self
            .balance
            .checked_add(txn.signed_amount())
            .ok_or_else(|| LedgerError::InvalidInput("amount would overflow the balance".into()))?;

        debug!(id = %txn.id, kind = %txn.kind, amount = %txn.amount, "appending transaction");
        self.balance = balance;
        self.transactions.push(txn.clone());
        Ok(txn)
    }

    /// Capture the current state as a backup and clear the ledger
    pub fn reset(&mut self) -> Backup {
        Backup {
            transactions: mem::take(&mut self.transactions),
            balance: mem::replace(&mut self.balance, Money::zero()),
        }
    }

    /// Replace the ledger with a backup's contents verbatim
    pub fn restore(&mut self, backup: Option<Backup>) -> LedgerResult<()> {
        let backup = backup.ok_or(LedgerError::NoBackup)?;
        self.transactions = backup.transactions;
        self.balance = backup.balance;
        Ok(())
    }

    /// Recompute the balance by summation and compare with the maintained one
    pub fn verify(&self) -> bool {
        Self::sum_signed(&self.transactions) == Some(self.balance)
    }

    fn sum_signed(transactions: &[Transaction]) -> Option<Money> {
        transactions
            .iter()
            .try_fold(Money::zero(), |acc, txn| acc.checked_add(txn.signed_amount()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.append(TransactionKind::Income, "1000", "Salary").unwrap();
        ledger.append(TransactionKind::Expense, "250.50", "Rent").unwrap();
        ledger
    }

    #[test]
    fn test_append_updates_balance() {
        let ledger = sample_ledger();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.balance().cents(), 74_950);
        assert!(ledger.verify());
    }

    #[test]
    fn test_append_preserves_order() {
        let ledger = sample_ledger();
        let categories: Vec<_> = ledger.transactions().iter().map(|t| t.category.as_str()).collect();
        assert_eq!(categories, vec!["Salary", "Rent"]);
    }

    #[test]
    fn test_append_negative_amount_strips_sign() {
        let mut ledger = Ledger::new();
        let txn = ledger.append(TransactionKind::Income, "-30", "Bonus").unwrap();
        assert_eq!(txn.amount.cents(), 3000);
        assert_eq!(ledger.balance().cents(), 3000);
    }

    #[test]
    fn test_append_invalid_input_leaves_ledger_untouched() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();

        assert!(ledger.append(TransactionKind::Expense, "abc", "Rent").unwrap_err().is_invalid_input());
        assert!(ledger.append(TransactionKind::Expense, "NaN", "Rent").unwrap_err().is_invalid_input());
        assert!(ledger.append(TransactionKind::Expense, "", "Rent").unwrap_err().is_invalid_input());
        assert!(ledger.append(TransactionKind::Expense, "10", "").unwrap_err().is_invalid_input());

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_append_overflow_rejected() {
        let mut ledger = Ledger::new();
        ledger
            .append_amount(TransactionKind::Income, Money::from_cents(i64::MAX), "Lottery")
            .unwrap();
        let err = ledger
            .append_amount(TransactionKind::Income, Money::from_cents(1), "Bonus")
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reset_returns_backup_and_clears() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();

        let backup = ledger.reset();
        assert!(ledger.is_empty());
        assert!(ledger.balance().is_zero());
        assert_eq!(backup.transactions(), before.transactions());
        assert_eq!(backup.balance(), before.balance());
    }

    #[test]
    fn test_reset_then_restore_round_trip() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();

        let backup = ledger.reset();
        ledger.restore(Some(backup)).unwrap();
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_reset_of_empty_ledger_round_trip() {
        let mut ledger = Ledger::new();
        let backup = ledger.reset();
        ledger.restore(Some(backup)).unwrap();
        assert_eq!(ledger, Ledger::new());
    }

    #[test]
    fn test_restore_without_backup() {
        let mut ledger = sample_ledger();
        let before = ledger.clone();
        assert!(matches!(ledger.restore(None), Err(LedgerError::NoBackup)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_from_transactions_derives_balance() {
        let ledger = sample_ledger();
        let seeded = Ledger::from_transactions(ledger.transactions().to_vec()).unwrap();
        assert_eq!(seeded, ledger);
    }

    #[test]
    fn test_from_transactions_normalises_signed_amounts() {
        let mut txn = Transaction::new(TransactionKind::Expense, Money::from_cents(500), "Water").unwrap();
        txn.amount = Money::from_cents(-500);

        let seeded = Ledger::from_transactions(vec![txn]).unwrap();
        assert_eq!(seeded.transactions()[0].amount.cents(), 500);
        assert_eq!(seeded.balance().cents(), -500);
    }

    #[quickcheck]
    fn prop_balance_is_signed_sum(entries: Vec<(bool, i32)>) -> bool {
        let mut ledger = Ledger::new();
        let mut expected: i64 = 0;
        for (is_income, cents) in entries {
            let cents = i64::from(cents);
            let (kind, sign) = if is_income {
                (TransactionKind::Income, 1)
            } else {
                (TransactionKind::Expense, -1)
            };
            let amount = Money::from_cents(cents).to_decimal_string();
            if ledger.append(kind, &amount, "Misc").is_err() {
                return false;
            }
            expected += sign * cents.abs();
        }
        ledger.balance().cents() == expected && ledger.verify()
    }
}
