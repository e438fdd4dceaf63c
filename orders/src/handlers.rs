//! HTTP handlers for the order service API.

use crate::store::{NewOrder, OrderStore};
use axum::{
    Json,
    extract::{Path, State},
};
use orderwire_core::money::Money;
use orderwire_core::order::{Order, OrderId};
use orderwire_core::account::UserId;
use orderwire_web::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request to create a new order.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// User placing the order.
    pub user_id: UserId,
    /// Amount to charge, in cents.
    pub amount: Money,
    /// Free-form description.
    pub description: String,
}

/// Response after creating an order.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    /// The new order's identifier.
    pub id: OrderId,
}

/// An order as returned by the read endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Order identifier.
    pub id: OrderId,
    /// User who placed the order.
    pub user_id: UserId,
    /// Amount in cents.
    pub amount: Money,
    /// Free-form description.
    pub description: String,
    /// Current lifecycle status.
    pub status: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            amount: order.amount,
            description: order.description,
            status: order.status.to_string(),
        }
    }
}

/// Create a new order.
///
/// The order and the `payment-task` event announcing it are committed in one
/// atomic store operation; the payment side picks the task up asynchronously.
///
/// # Endpoint
///
/// ```text
/// POST /orders
/// {"userId": "...", "amount": 400, "description": "widgets"}
/// ```
///
/// # Errors
///
/// Returns an internal error if the task payload cannot be encoded.
pub async fn create_order(
    State(store): State<Arc<OrderStore>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let order = store
        .submit(NewOrder {
            user_id: request.user_id,
            amount: request.amount,
            description: request.description,
        })
        .await?;

    Ok(Json(CreateOrderResponse { id: order.id }))
}

/// List all orders.
///
/// # Endpoint
///
/// ```text
/// GET /orders
/// ```
pub async fn list_orders(State(store): State<Arc<OrderStore>>) -> Json<Vec<OrderResponse>> {
    let orders = store.orders().await.into_iter().map(Into::into).collect();
    Json(orders)
}

/// Get a single order.
///
/// # Endpoint
///
/// ```text
/// GET /orders/{id}
/// ```
///
/// # Errors
///
/// Returns 404 if no order with that id exists.
pub async fn get_order(
    State(store): State<Arc<OrderStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let id = OrderId::from(id);
    store
        .order(id)
        .await
        .map(|order| Json(order.into()))
        .ok_or_else(|| AppError::not_found("Order", id))
}
