//! Remote API paths.

use super::types::CategoryKind;

pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const GET_ALL_CATEGORIES: &str = "/category/get-category";
pub const ADD_CATEGORY: &str = "/category/save-category";
pub const UPDATE_CATEGORY: &str = "/category/update-category";
pub const GET_ALL_INCOME: &str = "/income/getIncomesForCurrentMonth";
pub const ADD_INCOME: &str = "/income/add";
pub const GET_ALL_EXPENSES: &str = "/expense/getExpensesForCurrentMonth";
pub const ADD_EXPENSE: &str = "/expense/add";
pub const FILTER: &str = "/filter";
pub const DASHBOARD_DATA: &str = "/dashboard/get-data";
pub const RESET_TRANSACTIONS: &str = "/dashboard/reset";

#[must_use]
pub fn category_by_type(kind: CategoryKind) -> String {
    format!("/category/{}", kind.as_str())
}
