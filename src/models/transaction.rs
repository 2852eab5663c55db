//! Transaction model
//!
//! A transaction is an income or an expense of a non-negative amount in a
//! category. Records are immutable once created; only `kind` determines how
//! the amount affects the balance.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::ids::TransactionId;
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

/// Whether a transaction adds to or subtracts from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Apply the kind's sign to a non-negative amount
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "+" => Ok(Self::Income),
            "expense" | "out" | "-" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidInput(format!(
                "'{}' is not a transaction kind (expected income or expense)",
                other
            ))),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Income or expense
    #[serde(alias = "type")]
    pub kind: TransactionKind,

    /// Amount, never negative
    pub amount: Money,

    /// Category label (advisory catalog, not validated against it)
    pub category: String,

    /// When the transaction was created
    ///
    /// Older records store a locale date string under `date`, or nothing;
    /// those are read leniently and fall back to the time of loading.
    #[serde(
        alias = "date",
        default = "Utc::now",
        deserialize_with = "deserialize_created_at"
    )]
    pub created_at: DateTime<Utc>,
}

/// Day-first is tried before month-first
const LEGACY_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y"];

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    LEGACY_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some(raw) => parse_created_at(raw).unwrap_or_else(|| {
            debug!(date = raw, "unrecognised stored date; using load time");
            Utc::now()
        }),
        None => Utc::now(),
    })
}

impl Transaction {
    /// Create a new transaction, normalising the amount to its absolute value
    /// and trimming the category.
    pub fn new(kind: TransactionKind, amount: Money, category: &str) -> LedgerResult<Self> {
        let category = category.trim();
        if category.is_empty() {
            return Err(LedgerError::empty_category());
        }
        let amount = amount
            .checked_abs()
            .ok_or_else(|| LedgerError::invalid_amount(amount.to_decimal_string()))?;

        Ok(Self {
            id: TransactionId::new(),
            kind,
            amount,
            category: category.to_string(),
            created_at: Utc::now(),
        })
    }

    /// The amount with the kind's sign applied
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_income() { "+" } else { "-" };
        write!(
            f,
            "{} {} {}{}",
            self.created_at.format("%Y-%m-%d"),
            self.category,
            sign,
            self.amount
        )
    }
}
