//! Category catalog
//!
//! The catalog lists suggested category labels per transaction kind. It is
//! advisory only: the ledger accepts any non-empty category.

use serde::{Deserialize, Serialize};

use super::transaction::TransactionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    #[serde(default)]
    pub income: Vec<String>,
    #[serde(default)]
    pub expense: Vec<String>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|n| n.to_string()).collect() };
        Self {
            income: owned(&["Salary", "Bonus", "Other"]),
            expense: owned(&[
                "Gym",
                "Internet",
                "Phone",
                "Electricity",
                "Water",
                "Rent",
                "Other",
            ]),
        }
    }
}

impl CategoryCatalog {
    /// Suggested categories for a transaction kind
    pub fn for_kind(&self, kind: TransactionKind) -> &[String] {
        match kind {
            TransactionKind::Income => &self.income,
            TransactionKind::Expense => &self.expense,
        }
    }

    /// Whether `category` is listed for `kind` (case-insensitive)
    pub fn contains(&self, kind: TransactionKind, category: &str) -> bool {
        let category = category.trim();
        self.for_kind(kind)
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = CategoryCatalog::default();
        assert!(catalog.contains(TransactionKind::Income, "salary"));
        assert!(catalog.contains(TransactionKind::Expense, " Rent "));
        assert!(!catalog.contains(TransactionKind::Income, "Rent"));
    }

    #[test]
    fn test_partial_json_uses_empty_lists() {
        let catalog: CategoryCatalog = serde_json::from_str(r#"{"income": ["Tips"]}"#).unwrap();
        assert_eq!(catalog.for_kind(TransactionKind::Income), ["Tips".to_string()]);
        assert!(catalog.for_kind(TransactionKind::Expense).is_empty());
    }
}
