//! Typed operations over the remote money-manager API.
//!
//! DESIGN
//! ======
//! `MoneyApi` owns nothing but a shared `Gateway`; every method builds one
//! `ApiRequest`, sends it through the gateway and decodes the body. Form
//! checks run first so a rejected form never produces a network call.
//!
//! ERROR HANDLING
//! ==============
//! Gateway failures pass through unchanged inside `ApiError::Gateway`, so a
//! caller can still read the status and server message of a 4xx/5xx.

pub mod endpoints;
pub mod types;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::sync::Arc;

pub use types::{
    Category, CategoryKind, Credentials, Dashboard, FilterQuery, LoginResponse, NewCategory, NewTransaction,
    Registration, SortOrder, Transaction, ValidationError, search_transactions, total_amount,
};

use crate::gateway::{ApiRequest, Gateway, GatewayError};
use crate::session::User;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("login response did not include both a token and a user")]
    InvalidLoginResponse,
}

impl ApiError {
    /// Message to show the user: the server's own message when it sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(err) => err.server_message().unwrap_or_else(|| err.to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoneyApi {
    gateway: Arc<Gateway>,
}

impl MoneyApi {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// Authenticate and store the returned session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLoginResponse` unless the server answered 200 with
    /// both a token and a user. The session is left untouched in that case.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        credentials.validate()?;
        let response = self.gateway.send(ApiRequest::post(endpoints::LOGIN).json(credentials)?).await?;
        if response.status != 200 {
            tracing::warn!(status = response.status, "unexpected login status");
            return Err(ApiError::InvalidLoginResponse);
        }

        let LoginResponse { token: Some(token), user: Some(user) } = response.json::<LoginResponse>()? else {
            return Err(ApiError::InvalidLoginResponse);
        };
        self.gateway.session().login(token, user.clone());
        tracing::info!(user = %user.id, "signed in");
        Ok(user)
    }

    /// Create an account. The new account is not signed in.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields or the gateway error.
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        registration.validate()?;
        self.gateway.send(ApiRequest::post(endpoints::REGISTER).json(registration)?).await?;
        Ok(())
    }

    /// Local sign-out; no network call.
    pub fn logout(&self) {
        self.gateway.session().logout();
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.gateway.send(ApiRequest::get(endpoints::GET_ALL_CATEGORIES)).await?.json()?)
    }

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn categories_by_type(&self, kind: CategoryKind) -> Result<Vec<Category>, ApiError> {
        Ok(self.gateway.send(ApiRequest::get(endpoints::category_by_type(kind))).await?.json()?)
    }

    /// Save a category unless its name duplicates one in `existing`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any call is made, or the gateway error.
    pub async fn add_category(&self, category: &NewCategory, existing: &[Category]) -> Result<Category, ApiError> {
        category.validate(existing)?;
        let request = ApiRequest::post(endpoints::ADD_CATEGORY).json(category)?;
        Ok(self.gateway.send(request).await?.json()?)
    }

    /// # Errors
    ///
    /// Returns `Validation` for a blank name, or the gateway error.
    pub async fn update_category(&self, category: &Category) -> Result<Category, ApiError> {
        if category.name.trim().is_empty() {
            return Err(ValidationError::Required("category name").into());
        }
        let request = ApiRequest::put(endpoints::UPDATE_CATEGORY).json(category)?;
        Ok(self.gateway.send(request).await?.json()?)
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn current_month_incomes(&self) -> Result<Vec<Transaction>, ApiError> {
        Ok(self.gateway.send(ApiRequest::get(endpoints::GET_ALL_INCOME)).await?.json()?)
    }

    /// # Errors
    ///
    /// Returns `Validation` before any call is made, or the gateway error.
    pub async fn add_income(&self, income: &NewTransaction) -> Result<Transaction, ApiError> {
        self.add_transaction(endpoints::ADD_INCOME, income).await
    }

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn current_month_expenses(&self) -> Result<Vec<Transaction>, ApiError> {
        Ok(self.gateway.send(ApiRequest::get(endpoints::GET_ALL_EXPENSES)).await?.json()?)
    }

    /// # Errors
    ///
    /// Returns `Validation` before any call is made, or the gateway error.
    pub async fn add_expense(&self, expense: &NewTransaction) -> Result<Transaction, ApiError> {
        self.add_transaction(endpoints::ADD_EXPENSE, expense).await
    }

    async fn add_transaction(&self, path: &str, transaction: &NewTransaction) -> Result<Transaction, ApiError> {
        transaction.validate()?;
        let request = ApiRequest::post(path).json(transaction)?;
        Ok(self.gateway.send(request).await?.json()?)
    }

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn filter(&self, query: &FilterQuery) -> Result<Vec<Transaction>, ApiError> {
        let request = ApiRequest::post(endpoints::FILTER).json(query)?;
        Ok(self.gateway.send(request).await?.json()?)
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error or a decode failure.
    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        Ok(self.gateway.send(ApiRequest::get(endpoints::DASHBOARD_DATA)).await?.json()?)
    }

    /// Delete every income and expense of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn reset_transactions(&self) -> Result<(), ApiError> {
        self.gateway.send(ApiRequest::delete(endpoints::RESET_TRANSACTIONS)).await?;
        Ok(())
    }
}
