//! Transaction display formatting
//!
//! Formats transactions and the balance for terminal output.

use crate::config::settings::is_valid_date_format;
use crate::models::{Money, Transaction, TransactionKind};

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a single transaction as a list row
///
/// An unusable `date_format` falls back to `%Y-%m-%d`.
pub fn format_transaction_row(txn: &Transaction, symbol: &str, date_format: &str) -> String {
    let date_format = if is_valid_date_format(date_format) {
        date_format
    } else {
        FALLBACK_DATE_FORMAT
    };
    let sign = match txn.kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    format!(
        "{:8} {:10} {:7} {:20} {:>14}",
        txn.id.short(),
        txn.created_at.format(date_format),
        txn.kind,
        truncate(&txn.category, 20),
        format!("{}{}", sign, txn.amount.format_with_symbol(symbol))
    )
}

/// Format transactions as a list with a header
pub fn format_transaction_list(transactions: &[Transaction], symbol: &str, date_format: &str) -> String {
    if transactions.is_empty() {
        return "No transactions recorded.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:8} {:10} {:7} {:20} {:>14}\n",
        "ID", "Date", "Kind", "Category", "Amount"
    ));
    output.push_str(&"-".repeat(63));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, symbol, date_format));
        output.push('\n');
    }

    output
}

pub fn format_balance(balance: Money, symbol: &str) -> String {
    format!("Balance: {}", balance.format_with_symbol(symbol))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
