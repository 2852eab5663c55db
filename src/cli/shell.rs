//! Interactive ledger shell
//!
//! Runs a line-oriented session against one controller, so the reset
//! confirmation step and the one-level undo behave as they do in an app.

use std::io::{BufRead, Write};

use crate::config::settings::Settings;
use crate::display::{format_balance, format_transaction_list};
use crate::error::{LedgerError, LedgerResult};
use crate::models::TransactionKind;
use crate::services::{Mutation, ReconciliationController};
use crate::storage::KeyValueStore;

const HELP: &str = "\
Commands:
  add <income|expense> <amount> <category>   Record a transaction
  list                                       List transactions
  balance                                    Show the balance
  report                                     Spending by category
  categories                                 Suggested categories
  reset                                      Clear everything (asks to confirm)
  confirm / cancel                           Answer a pending reset
  undo                                       Restore the ledger before the last reset
  help                                       Show this help
  quit                                       Leave the shell
";

/// Run the shell until `quit` or end of input
pub async fn run_shell<S, R, W>(
    controller: &mut ReconciliationController<S>,
    settings: &Settings,
    input: R,
    out: &mut W,
) -> LedgerResult<()>
where
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    writeln!(out, "pocket ledger shell. Type 'help' for commands.")?;
    writeln!(out, "{}", format_balance(controller.balance(), &settings.currency_symbol))?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        // Command errors are shown and the session continues
        if let Err(e) = run_line(controller, settings, line, out).await {
            match e {
                LedgerError::Io(_) => return Err(e),
                other => writeln!(out, "Error: {}", other)?,
            }
        }
    }

    Ok(())
}

async fn run_line<S, W>(
    controller: &mut ReconciliationController<S>,
    settings: &Settings,
    line: &str,
    out: &mut W,
) -> LedgerResult<()>
where
    S: KeyValueStore,
    W: Write,
{
    let symbol = settings.currency_symbol.as_str();
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();

    match command {
        "add" => {
            let (kind, amount) = match (words.next(), words.next()) {
                (Some(kind), Some(amount)) => (kind.parse::<TransactionKind>()?, amount),
                _ => {
                    return Err(LedgerError::InvalidInput(
                        "usage: add <income|expense> <amount> <category>".into(),
                    ))
                }
            };
            let category = words.collect::<Vec<_>>().join(" ");
            if !category.is_empty() && !settings.categories.contains(kind, &category) {
                writeln!(out, "Note: '{}' is not a suggested category.", category)?;
            }

            let mutation = controller.add_transaction(kind, amount, &category).await?;
            writeln!(
                out,
                "Added {} {}",
                mutation.value.category,
                mutation.value.amount.format_with_symbol(symbol)
            )?;
            write_warning(&mutation, out)?;
            writeln!(out, "{}", format_balance(controller.balance(), symbol))?;
        }
        "list" => {
            write!(
                out,
                "{}",
                format_transaction_list(controller.transactions(), symbol, &settings.date_format)
            )?;
        }
        "balance" => {
            writeln!(out, "{}", format_balance(controller.balance(), symbol))?;
        }
        "report" => {
            write!(out, "{}", controller.spending_report()?.format_terminal(symbol))?;
        }
        "categories" => {
            writeln!(out, "Income:  {}", settings.categories.income.join(", "))?;
            writeln!(out, "Expense: {}", settings.categories.expense.join(", "))?;
        }
        "reset" => {
            controller.request_reset()?;
            writeln!(
                out,
                "Reset all transactions and the balance? Type 'confirm' or 'cancel'."
            )?;
        }
        "confirm" => {
            let mutation = controller.confirm_reset().await?;
            writeln!(out, "Ledger reset. Type 'undo' to restore it.")?;
            write_warning(&mutation, out)?;
        }
        "cancel" => {
            controller.cancel_reset()?;
            writeln!(out, "Reset cancelled.")?;
        }
        "undo" => {
            let mutation = controller.undo_reset().await?;
            writeln!(out, "Reset undone.")?;
            write_warning(&mutation, out)?;
            writeln!(out, "{}", format_balance(controller.balance(), symbol))?;
        }
        "help" => write!(out, "{}", HELP)?,
        other => writeln!(out, "Unknown command '{}'. Type 'help' for commands.", other)?,
    }

    Ok(())
}

fn write_warning<T, W: Write>(mutation: &Mutation<T>, out: &mut W) -> LedgerResult<()> {
    if let Some(warning) = mutation.warning() {
        writeln!(out, "Warning: {}", warning)?;
    }
    Ok(())
}
