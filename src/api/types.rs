//! Wire types exchanged with the remote API and their client-side checks.
//!
//! JSON field names follow the backend (camelCase). Required-field checks
//! run before a request is built; a failed check never reaches the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::User;

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

/// A required form field was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("category with same name already exists")]
    DuplicateCategory,
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::Required(field)) } else { Ok(()) }
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.email, "email")?;
        require(&self.password, "password")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.full_name, "full name")?;
        require(&self.email, "email")?;
        require(&self.password, "password")
    }
}

/// Body of a login response. Both fields must be present for the login to
/// count.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub user: Option<User>,
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown category type '{other}' (expected 'income' or 'expense')")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Value,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<CategoryKind>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub icon: String,
}

impl NewCategory {
    /// Check the name and reject duplicates of `existing` (case-insensitive,
    /// surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns `Required` for a blank name or `DuplicateCategory`.
    pub fn validate(&self, existing: &[Category]) -> Result<(), ValidationError> {
        require(&self.name, "category name")?;
        let wanted = self.name.trim().to_lowercase();
        if existing.iter().any(|c| c.name.trim().to_lowercase() == wanted) {
            return Err(ValidationError::DuplicateCategory);
        }
        Ok(())
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// An income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<Value>,
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category_id: Option<Value>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub icon: String,
    pub category_id: String,
}

impl NewTransaction {
    /// Name, amount, date and category are required.
    ///
    /// # Errors
    ///
    /// Returns the first missing field. A zero or non-finite amount counts
    /// as missing; negative amounts are left to the server.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(&self.name, "name")?;
        if !self.amount.is_finite() || self.amount == 0.0 {
            return Err(ValidationError::Required("amount"));
        }
        require(&self.date, "date")?;
        require(&self.category_id, "category")
    }
}

/// Sum of `amount` over `transactions`.
#[must_use]
pub fn total_amount(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(|t| t.amount).sum()
}

/// Case-insensitive search on name or category name. A blank term matches
/// everything.
#[must_use]
pub fn search_transactions<'a>(transactions: &'a [Transaction], term: &str) -> Vec<&'a Transaction> {
    let term = term.trim().to_lowercase();
    transactions
        .iter()
        .filter(|t| {
            term.is_empty()
                || t.name.to_lowercase().contains(&term)
                || t.category_name.as_deref().is_some_and(|c| c.to_lowercase().contains(&term))
        })
        .collect()
}

// =============================================================================
// FILTER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}' (expected 'asc' or 'desc')")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub start_date: String,
    pub end_date: String,
    pub keyword: String,
    pub sort_order: SortOrder,
}

impl Default for FilterQuery {
    fn default() -> Self {
        Self {
            kind: CategoryKind::Income,
            start_date: String::new(),
            end_date: String::new(),
            keyword: String::new(),
            sort_order: SortOrder::Asc,
        }
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(rename = "totalIncome", default)]
    pub total_income: f64,
    #[serde(rename = "totalExpenses", default)]
    pub total_expenses: f64,
    #[serde(rename = "RecentTransactions", alias = "recentTransactions", default)]
    pub recent_transactions: Vec<Transaction>,
    #[serde(rename = "latest5Income", default)]
    pub latest_income: Vec<Transaction>,
    #[serde(rename = "latest5expenses", alias = "latest5Expenses", default)]
    pub latest_expenses: Vec<Transaction>,
}

impl Dashboard {
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}
