//! Spending Report
//!
//! Expense totals per category, with each category's share of all spending.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Transaction};

/// Sum expense amounts per category
///
/// Income is ignored and categories whose expenses total zero are absent.
/// Pure; safe on any snapshot of transactions. Fails with `InvalidInput` if a
/// category's total does not fit in the money range.
pub fn aggregate_expenses_by_category(
    transactions: &[Transaction],
) -> LedgerResult<HashMap<String, Money>> {
    let mut totals: HashMap<String, Money> = HashMap::new();
    for txn in transactions.iter().filter(|t| t.is_expense()) {
        let total = totals.entry(txn.category.clone()).or_default();
        *total = total
            .checked_add(txn.amount)
            .ok_or_else(|| total_overflow(&txn.category))?;
    }
    totals.retain(|_, total| !total.is_zero());
    Ok(totals)
}

fn total_overflow(what: &str) -> LedgerError {
    LedgerError::InvalidInput(format!("{} total is too large to report", what))
}

fn checked_total<'a>(mut amounts: impl Iterator<Item = &'a Money>) -> Option<Money> {
    amounts.try_fold(Money::zero(), |acc, amount| acc.checked_add(*amount))
}

/// Spending in one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpending {
    pub category: String,
    pub total: Money,
    /// Share of total spending, 0-100
    pub percentage: f64,
}

/// Spending Report
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingReport {
    /// Categories ordered by total, largest first
    pub categories: Vec<CategorySpending>,
    pub total_spending: Money,
    pub total_income: Money,
}

impl SpendingReport {
    pub fn generate(transactions: &[Transaction]) -> LedgerResult<Self> {
        let totals = aggregate_expenses_by_category(transactions)?;
        let total_spending =
            checked_total(totals.values()).ok_or_else(|| total_overflow("Spending"))?;
        let total_income = checked_total(
            transactions
                .iter()
                .filter(|t| t.is_income())
                .map(|t| &t.amount),
        )
        .ok_or_else(|| total_overflow("Income"))?;

        let mut categories: Vec<CategorySpending> = totals
            .into_iter()
            .map(|(category, total)| {
                let percentage = if total_spending.is_zero() {
                    0.0
                } else {
                    (total.cents() as f64 / total_spending.cents() as f64) * 100.0
                };
                CategorySpending {
                    category,
                    total,
                    percentage,
                }
            })
            .collect();

        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        Ok(Self {
            categories,
            total_spending,
            total_income,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Render as plain text
    pub fn format_terminal(&self, symbol: &str) -> String {
        let mut output = String::new();
        output.push_str("Spending by Category\n");
        output.push_str(&"=".repeat(44));
        output.push('\n');

        if self.is_empty() {
            output.push_str("No expenses recorded yet.\n");
            return output;
        }

        for row in &self.categories {
            output.push_str(&format!(
                "{:20} {:>14} {:>6.1}%\n",
                row.category,
                row.total.format_with_symbol(symbol),
                row.percentage
            ));
        }

        output.push_str(&"-".repeat(44));
        output.push('\n');
        output.push_str(&format!(
            "{:20} {:>14}\n",
            "Total spending",
            self.total_spending.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "{:20} {:>14}\n",
            "Total income",
            self.total_income.format_with_symbol(symbol)
        ));
        output
    }

    /// Write the report as CSV (category,total,percentage)
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> LedgerResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["category", "total", "percentage"])
            .map_err(csv_error)?;
        for row in &self.categories {
            let total = row.total.to_decimal_string();
            let percentage = format!("{:.2}", row.percentage);
            out.write_record([row.category.as_str(), total.as_str(), percentage.as_str()])
                .map_err(csv_error)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> LedgerError {
    LedgerError::Io(format!("Failed to write CSV: {}", e))
}
