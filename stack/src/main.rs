//! Orderwire stack binary.
//!
//! Runs the order service, the payment service, the background loops, and
//! the gateway in one process, wired over the in-memory event bus.
//!
//! ```bash
//! RUST_LOG=info cargo run --bin orderwire
//!
//! # Then, through the gateway:
//! curl -X POST http://localhost:8080/accounts \
//!   -H 'Content-Type: application/json' \
//!   -d '{"userId": "7b0f3c1e-2c4e-4b6e-9f3a-111111111111"}'
//! curl -X POST http://localhost:8080/accounts/topup \
//!   -H 'Content-Type: application/json' \
//!   -d '{"userId": "7b0f3c1e-2c4e-4b6e-9f3a-111111111111", "amount": 1000}'
//! curl -X POST http://localhost:8080/orders \
//!   -H 'Content-Type: application/json' \
//!   -d '{"userId": "7b0f3c1e-2c4e-4b6e-9f3a-111111111111", "amount": 400, "description": "widgets"}'
//! ```

use orderwire_stack::{Config, launch};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        gateway = %config.gateway_addr,
        orders = %config.orders_addr,
        payments = %config.payments_addr,
        outbox_poll_ms = config.outbox_poll.as_millis(),
        settle_poll_ms = config.settle_poll.as_millis(),
        "Configuration loaded"
    );

    let running = launch(config).await?;
    info!(gateway = %running.gateway_addr, "Orderwire is up; press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    running.shutdown().await;

    Ok(())
}
