//! HTTP handlers for the payment service API.

use crate::store::PaymentStore;
use axum::{
    Json,
    extract::{Path, State},
};
use orderwire_core::account::{Account, UserId};
use orderwire_core::money::Money;
use orderwire_web::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request to register an account.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// The user to open an account for.
    pub user_id: UserId,
}

/// Request to add funds to an account.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    /// The account's owning user.
    pub user_id: UserId,
    /// Amount to add, in cents.
    pub amount: Money,
}

/// An account as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Owning user.
    pub user_id: UserId,
    /// Current balance in cents.
    pub balance: Money,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id,
            balance: account.balance,
        }
    }
}

/// Register an account for a user.
///
/// # Endpoint
///
/// ```text
/// POST /accounts
/// {"userId": "..."}
/// ```
///
/// # Errors
///
/// Returns 400 if the user already has an account; the existing account is
/// unaffected.
pub async fn create_account(
    State(store): State<Arc<PaymentStore>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = store.open_account(request.user_id).await?;
    Ok(Json(account.into()))
}

/// Add funds to an account.
///
/// # Endpoint
///
/// ```text
/// POST /accounts/topup
/// {"userId": "...", "amount": 1000}
/// ```
///
/// # Errors
///
/// Returns 404 if the user has no account.
pub async fn top_up(
    State(store): State<Arc<PaymentStore>>,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = store.top_up(request.user_id, request.amount).await?;
    Ok(Json(account.into()))
}

/// Get a user's account.
///
/// # Endpoint
///
/// ```text
/// GET /accounts/{userId}
/// ```
///
/// # Errors
///
/// Returns 404 if the user has no account.
pub async fn get_account(
    State(store): State<Arc<PaymentStore>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let user_id = UserId::from(user_id);
    store
        .account(user_id)
        .await
        .map(|account| Json(account.into()))
        .ok_or_else(|| AppError::not_found("Account", user_id))
}
