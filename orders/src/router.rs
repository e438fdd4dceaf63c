//! Order service HTTP router.

use crate::handlers;
use crate::store::OrderStore;
use axum::{
    Router,
    routing::get,
};
use orderwire_web::health_check;
use std::sync::Arc;

/// Create the order service router.
///
/// # Routes
///
/// - `POST /orders` - Create a new order
/// - `GET /orders` - List all orders
/// - `GET /orders/{id}` - Get order details
/// - `GET /health` - Liveness check
pub fn order_router(store: Arc<OrderStore>) -> Router {
    Router::new()
        .route("/orders", get(handlers::list_orders).post(handlers::create_order))
        .route("/orders/:id", get(handlers::get_order))
        .route("/health", get(health_check))
        .with_state(store)
}
