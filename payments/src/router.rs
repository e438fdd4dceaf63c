//! Payment service HTTP router.

use crate::handlers;
use crate::store::PaymentStore;
use axum::{
    Router,
    routing::{get, post},
};
use orderwire_web::health_check;
use std::sync::Arc;

/// Create the payment service router.
///
/// # Routes
///
/// - `POST /accounts` - Register an account
/// - `POST /accounts/topup` - Add funds
/// - `GET /accounts/{userId}` - Get account balance
/// - `GET /health` - Liveness check
pub fn account_router(store: Arc<PaymentStore>) -> Router {
    Router::new()
        .route("/accounts", post(handlers::create_account))
        .route("/accounts/topup", post(handlers::top_up))
        .route("/accounts/:user_id", get(handlers::get_account))
        .route("/health", get(health_check))
        .with_state(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use axum_test::TestServer;
    use orderwire_core::account::UserId;
    use serde_json::{Value, json};

    fn server() -> (TestServer, Arc<PaymentStore>) {
        let store = Arc::new(PaymentStore::new());
        let server = TestServer::new(account_router(Arc::clone(&store))).unwrap();
        (server, store)
    }

    #[tokio::test]
    async fn account_lifecycle_over_http() {
        let (server, _store) = server();
        let user = UserId::new();

        server
            .post("/accounts")
            .json(&json!({"userId": user}))
            .await
            .assert_status_ok();

        let topped = server
            .post("/accounts/topup")
            .json(&json!({"userId": user, "amount": 1000}))
            .await;
        topped.assert_status_ok();
        let body: Value = topped.json();
        assert_eq!(body["balance"], 1000);

        let fetched = server.get(&format!("/accounts/{user}")).await;
        fetched.assert_status_ok();
        let body: Value = fetched.json();
        assert_eq!(body["userId"], json!(user));
        assert_eq!(body["balance"], 1000);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_client_error() {
        let (server, _store) = server();
        let user = UserId::new();

        server
            .post("/accounts")
            .json(&json!({"userId": user}))
            .await
            .assert_status_ok();
        server
            .post("/accounts/topup")
            .json(&json!({"userId": user, "amount": 500}))
            .await
            .assert_status_ok();

        let second = server.post("/accounts").json(&json!({"userId": user})).await;
        second.assert_status_bad_request();

        // The first registration's balance is unaffected.
        let fetched = server.get(&format!("/accounts/{user}")).await;
        let body: Value = fetched.json();
        assert_eq!(body["balance"], 500);
    }

    #[tokio::test]
    async fn top_up_unknown_user_is_not_found() {
        let (server, _store) = server();
        server
            .post("/accounts/topup")
            .json(&json!({"userId": UserId::new(), "amount": 100}))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn get_unknown_account_is_not_found() {
        let (server, _store) = server();
        server
            .get(&format!("/accounts/{}", UserId::new()))
            .await
            .assert_status_not_found();
    }
}
