//! # Orderwire Stack
//!
//! Wires the whole system into one process: the shared in-memory event bus,
//! both service stores, the outbox publishers, the inbound consumers, the
//! settlement processor, and the three HTTP listeners (orders, payments,
//! gateway).
//!
//! [`launch`] binds every listener and starts every loop before returning;
//! a bind failure is fatal and nothing half-starts. The returned [`Running`]
//! handle exposes the bound addresses and shuts the stack down cleanly:
//! every background loop is bound to a cancellation signal that interrupts
//! an in-flight wait.

pub mod config;

pub use config::Config;

use anyhow::Context;
use axum::Router;
use orderwire_bus::InMemoryEventBus;
use orderwire_core::bus::EventBus;
use orderwire_core::store::OutboxSource;
use orderwire_gateway::{RouteTable, gateway_router};
use orderwire_orders::{OrderStore, ResultConsumer, order_router};
use orderwire_payments::{PaymentStore, SettlementProcessor, TaskConsumer, account_router};
use orderwire_relay::OutboxPublisher;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// A launched stack: bound addresses plus the handles needed to stop it.
pub struct Running {
    /// Gateway listen address.
    pub gateway_addr: SocketAddr,
    /// Order service listen address.
    pub orders_addr: SocketAddr,
    /// Payment service listen address.
    pub payments_addr: SocketAddr,
    /// Order store, shared with the running services.
    pub orders: Arc<OrderStore>,
    /// Payment store, shared with the running services.
    pub payments: Arc<PaymentStore>,
    shutdown: Vec<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Running {
    /// Signals every loop and server to stop and waits for them to finish.
    pub async fn shutdown(self) {
        for sender in &self.shutdown {
            sender.send(true).ok();
        }
        for task in self.tasks {
            task.await.ok();
        }
        tracing::info!("Stack stopped");
    }
}

/// Binds all listeners and starts all background loops.
///
/// The consumers subscribe as they start; until they do, outbox publishes
/// are refused by the bus and retried, so no event can be lost during
/// startup.
///
/// # Errors
///
/// Returns an error if any listener fails to bind; the process must not
/// start half-wired.
pub async fn launch(config: Config) -> anyhow::Result<Running> {
    let bus = Arc::new(InMemoryEventBus::new());
    let orders = Arc::new(OrderStore::new());
    let payments = Arc::new(PaymentStore::new());

    let mut shutdown = Vec::new();
    let mut tasks = Vec::new();

    // Inbound consumers, one per service.
    let (result_consumer, stop) = ResultConsumer::new(
        Arc::clone(&orders),
        Arc::clone(&bus) as Arc<dyn EventBus>,
    );
    shutdown.push(stop);
    tasks.push(tokio::spawn(async move {
        if let Err(e) = result_consumer.run().await {
            tracing::error!(error = %e, "Payment-result consumer failed");
        }
    }));

    let (task_consumer, stop) = TaskConsumer::new(
        Arc::clone(&payments),
        Arc::clone(&bus) as Arc<dyn EventBus>,
    );
    shutdown.push(stop);
    tasks.push(tokio::spawn(async move {
        if let Err(e) = task_consumer.run().await {
            tracing::error!(error = %e, "Payment-task consumer failed");
        }
    }));

    // Outbox publishers, one per service.
    let (orders_publisher, stop) = OutboxPublisher::new(
        Arc::clone(&orders) as Arc<dyn OutboxSource>,
        Arc::clone(&bus) as Arc<dyn EventBus>,
        "orders",
        config.outbox_poll,
    );
    shutdown.push(stop);
    tasks.push(tokio::spawn(async move {
        if let Err(e) = orders_publisher.run().await {
            tracing::error!(error = %e, "Orders outbox publisher failed");
        }
    }));

    let (payments_publisher, stop) = OutboxPublisher::new(
        Arc::clone(&payments) as Arc<dyn OutboxSource>,
        Arc::clone(&bus) as Arc<dyn EventBus>,
        "payments",
        config.outbox_poll,
    );
    shutdown.push(stop);
    tasks.push(tokio::spawn(async move {
        if let Err(e) = payments_publisher.run().await {
            tracing::error!(error = %e, "Payments outbox publisher failed");
        }
    }));

    // Settlement processor (payment side only).
    let (processor, stop) = SettlementProcessor::new(Arc::clone(&payments), config.settle_poll);
    shutdown.push(stop);
    tasks.push(tokio::spawn(processor.run()));

    // HTTP listeners. Binding failures are fatal at startup.
    let orders_listener = TcpListener::bind(config.orders_addr)
        .await
        .with_context(|| format!("failed to bind order service on {}", config.orders_addr))?;
    let orders_addr = orders_listener.local_addr()?;

    let payments_listener = TcpListener::bind(config.payments_addr)
        .await
        .with_context(|| format!("failed to bind payment service on {}", config.payments_addr))?;
    let payments_addr = payments_listener.local_addr()?;

    let gateway_listener = TcpListener::bind(config.gateway_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {}", config.gateway_addr))?;
    let gateway_addr = gateway_listener.local_addr()?;

    // The gateway's routing table is injected configuration, pointed at the
    // addresses that actually got bound.
    let table = RouteTable::new()
        .route("/orders", format!("http://{orders_addr}"))
        .route("/accounts", format!("http://{payments_addr}"));

    let (server_stop, _) = watch::channel(false);
    tasks.push(serve(orders_listener, order_router(Arc::clone(&orders)), &server_stop));
    tasks.push(serve(payments_listener, account_router(Arc::clone(&payments)), &server_stop));
    tasks.push(serve(gateway_listener, gateway_router(table), &server_stop));
    shutdown.push(server_stop);

    tracing::info!(
        gateway = %gateway_addr,
        orders = %orders_addr,
        payments = %payments_addr,
        "Stack started"
    );

    Ok(Running {
        gateway_addr,
        orders_addr,
        payments_addr,
        orders,
        payments,
        shutdown,
        tasks,
    })
}

fn serve(listener: TcpListener, router: Router, stop: &watch::Sender<bool>) -> JoinHandle<()> {
    let mut stop = stop.subscribe();
    let app = router.layer(TraceLayer::new_for_http());

    tokio::spawn(async move {
        let shutdown = async move {
            // Wait for the stop signal; a closed channel also stops the server.
            while stop.changed().await.is_ok() {
                if *stop.borrow() {
                    break;
                }
            }
        };

        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
            tracing::error!(error = %e, "HTTP server failed");
        }
    })
}
