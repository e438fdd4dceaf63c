//! Full-system tests: gateway, both services, outbox publishers, consumers,
//! and the settlement processor running together over the in-memory bus.
//!
//! Everything goes through the gateway, the way an external client would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use orderwire_core::account::UserId;
use orderwire_stack::{Config, launch};
use serde_json::{Value, json};
use std::time::Duration;

/// Stack bound to ephemeral ports with fast poll cycles.
fn test_config() -> Config {
    Config {
        gateway_addr: ([127, 0, 0, 1], 0).into(),
        orders_addr: ([127, 0, 0, 1], 0).into(),
        payments_addr: ([127, 0, 0, 1], 0).into(),
        outbox_poll: Duration::from_millis(25),
        settle_poll: Duration::from_millis(25),
    }
}

struct Client {
    base: String,
    http: reqwest::Client,
}

impl Client {
    fn new(gateway: std::net::SocketAddr) -> Self {
        Self {
            base: format!("http://{gateway}"),
            http: reqwest::Client::new(),
        }
    }

    async fn open_account(&self, user: UserId) -> reqwest::Response {
        self.http
            .post(format!("{}/accounts", self.base))
            .json(&json!({"userId": user}))
            .send()
            .await
            .unwrap()
    }

    async fn top_up(&self, user: UserId, amount: i64) {
        let response = self
            .http
            .post(format!("{}/accounts/topup", self.base))
            .json(&json!({"userId": user, "amount": amount}))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    async fn balance(&self, user: UserId) -> i64 {
        let body: Value = self
            .http
            .get(format!("{}/accounts/{user}", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["balance"].as_i64().unwrap()
    }

    async fn place_order(&self, user: UserId, amount: i64) -> String {
        let response = self
            .http
            .post(format!("{}/orders", self.base))
            .json(&json!({"userId": user, "amount": amount, "description": "e2e"}))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn order_status(&self, id: &str) -> String {
        let body: Value = self
            .http
            .get(format!("{}/orders/{id}", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["status"].as_str().unwrap().to_string()
    }

    /// Polls until the order leaves the `New` status or the timeout expires.
    async fn settled_status(&self, id: &str) -> String {
        for _ in 0..200 {
            let status = self.order_status(id).await;
            if status != "New" {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("order {id} never settled");
    }
}

#[tokio::test]
async fn order_with_sufficient_funds_finishes_and_debits() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    let user = UserId::new();
    client.open_account(user).await;
    client.top_up(user, 1000).await;

    let order = client.place_order(user, 400).await;
    assert_eq!(client.settled_status(&order).await, "Finished");
    assert_eq!(client.balance(user).await, 600);

    running.shutdown().await;
}

#[tokio::test]
async fn order_exceeding_balance_is_cancelled_without_debit() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    let user = UserId::new();
    client.open_account(user).await;
    client.top_up(user, 1000).await;

    let order = client.place_order(user, 1500).await;
    assert_eq!(client.settled_status(&order).await, "Cancelled");
    assert_eq!(client.balance(user).await, 1000);

    running.shutdown().await;
}

#[tokio::test]
async fn order_for_user_without_account_is_cancelled() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    let order = client.place_order(UserId::new(), 100).await;
    assert_eq!(client.settled_status(&order).await, "Cancelled");

    running.shutdown().await;
}

#[tokio::test]
async fn duplicate_registration_fails_and_preserves_the_first_account() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    let user = UserId::new();
    assert!(client.open_account(user).await.status().is_success());
    client.top_up(user, 700).await;

    let second = client.open_account(user).await;
    assert_eq!(second.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(client.balance(user).await, 700);

    running.shutdown().await;
}

#[tokio::test]
async fn every_outbox_row_ends_processed_after_quiescence() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    let user = UserId::new();
    client.open_account(user).await;
    client.top_up(user, 10_000).await;

    let mut orders = Vec::new();
    for _ in 0..5 {
        orders.push(client.place_order(user, 100).await);
    }
    for order in &orders {
        assert_eq!(client.settled_status(order).await, "Finished");
    }
    assert_eq!(client.balance(user).await, 9500);

    // Quiescence: every produced event (5 tasks + 5 results) was published
    // and marked processed on both sides.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        use orderwire_core::store::OutboxSource;
        let orders_pending = running.orders.unpublished().await.unwrap().len();
        let payments_pending = running.payments.unpublished().await.unwrap().len();
        if orders_pending == 0 && payments_pending == 0 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "outbox never drained");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    running.shutdown().await;
}

#[tokio::test]
async fn requests_pass_through_the_gateway_unchanged() {
    let running = launch(test_config()).await.unwrap();
    let client = Client::new(running.gateway_addr);

    // An unmatched path is answered by the gateway itself.
    let response = client
        .http
        .get(format!("{}/inventory/1", client.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    // A matched path is answered by the backend (order service 404 here,
    // forwarded verbatim).
    let response = client
        .http
        .get(format!("{}/orders/{}", client.base, uuid_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");

    running.shutdown().await;
}

fn uuid_v4() -> String {
    UserId::new().to_string()
}
