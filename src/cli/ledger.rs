//! Ledger CLI commands
//!
//! One-shot commands run against the stored ledger. The undo backup lives
//! only as long as the process, so `undo` is only offered by the shell.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_balance, format_transaction_list};
use crate::error::LedgerResult;
use crate::models::TransactionKind;
use crate::services::{Mutation, ReconciliationController};
use crate::storage::KeyValueStore;

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Record an income or expense
    Add {
        /// income or expense
        kind: TransactionKind,
        /// Amount (e.g. "12.50"); a leading minus sign is ignored
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Category name
        #[arg(num_args = 1.., required = true)]
        category: Vec<String>,
    },

    /// List all transactions in the order they were added
    List,

    /// Show the current balance
    Balance,

    /// Show spending by category
    Report {
        /// Output CSV instead of a table
        #[arg(long)]
        csv: bool,
    },

    /// Show the suggested categories
    Categories,

    /// Clear all transactions and the balance
    Reset {
        /// Skip the confirmation step
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a ledger command
pub async fn handle_ledger_command<S: KeyValueStore>(
    controller: &mut ReconciliationController<S>,
    settings: &Settings,
    cmd: LedgerCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        LedgerCommands::Add {
            kind,
            amount,
            category,
        } => {
            let category = category.join(" ");
            if !settings.categories.contains(kind, &category) {
                eprintln!(
                    "Note: '{}' is not one of the suggested {} categories.",
                    category.trim(),
                    kind.to_string().to_lowercase()
                );
            }

            let mutation = controller.add_transaction(kind, &amount, &category).await?;
            let txn = &mutation.value;
            println!(
                "Added {} of {} to '{}'",
                txn.kind.to_string().to_lowercase(),
                txn.amount.format_with_symbol(symbol),
                txn.category
            );
            println!("{}", format_balance(controller.balance(), symbol));
            report_persistence(&mutation);
        }

        LedgerCommands::List => {
            print!(
                "{}",
                format_transaction_list(controller.transactions(), symbol, &settings.date_format)
            );
            println!();
            println!("{}", format_balance(controller.balance(), symbol));
        }

        LedgerCommands::Balance => {
            println!("{}", format_balance(controller.balance(), symbol));
        }

        LedgerCommands::Report { csv } => {
            let report = controller.spending_report()?;
            if csv {
                report.export_csv(&mut std::io::stdout().lock())?;
            } else {
                print!("{}", report.format_terminal(symbol));
            }
        }

        LedgerCommands::Categories => {
            println!("Income:  {}", settings.categories.income.join(", "));
            println!("Expense: {}", settings.categories.expense.join(", "));
        }

        LedgerCommands::Reset { force } => {
            controller.request_reset()?;
            if !force {
                controller.cancel_reset()?;
                println!(
                    "WARNING: This will clear {} transaction(s) and reset the balance to zero.",
                    controller.transactions().len()
                );
                println!("Undo is only available inside 'pocket shell'.");
                println!("To proceed, run again with --force flag:");
                println!("  pocket reset --force");
                return Ok(());
            }

            let mutation = controller.confirm_reset().await?;
            println!("Ledger reset. All transactions and the balance were cleared.");
            report_persistence(&mutation);
        }
    }

    Ok(())
}

pub(crate) fn report_persistence<T>(mutation: &Mutation<T>) {
    if let Some(warning) = mutation.warning() {
        eprintln!("Warning: {}", warning);
    }
}
