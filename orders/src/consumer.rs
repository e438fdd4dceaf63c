//! Inbound consumer for payment results.

use crate::store::{OrderStore, ResultApplied};
use futures::StreamExt;
use orderwire_core::bus::{EventBus, EventBusError};
use orderwire_core::event::{DomainEvent, EventKind, EventRecord};
use std::sync::Arc;
use tokio::sync::watch;

/// Subscribes to the `payment-result` topic and applies each outcome to the
/// order store.
///
/// Deliveries arrive zero or more times per logical event (at-least-once
/// transport); the store's correlation-key dedup absorbs repeats, so this
/// loop can apply every delivery it sees without further bookkeeping.
pub struct ResultConsumer {
    store: Arc<OrderStore>,
    bus: Arc<dyn EventBus>,
    shutdown: watch::Receiver<bool>,
}

impl ResultConsumer {
    /// Creates a consumer and the sender half of its shutdown signal.
    #[must_use]
    pub fn new(store: Arc<OrderStore>, bus: Arc<dyn EventBus>) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let consumer = Self {
            store,
            bus,
            shutdown: shutdown_rx,
        };

        (consumer, shutdown_tx)
    }

    /// Runs the consumer until the stream closes or shutdown fires.
    ///
    /// Decode failures and transport errors are logged and the loop keeps
    /// going; a single bad delivery must not stop result processing.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established; at startup this is fatal for the service.
    pub async fn run(mut self) -> Result<(), EventBusError> {
        let topic = EventKind::PaymentResult.topic();
        let mut stream = self.bus.subscribe(&[topic]).await?;
        tracing::info!(topic = topic, "Payment-result consumer started");

        loop {
            tokio::select! {
                maybe_event = stream.next() => {
                    match maybe_event {
                        Some(Ok(record)) => self.handle(record).await,
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Error receiving event from bus");
                        }
                        None => {
                            tracing::info!("Event stream closed, consumer exiting");
                            return Ok(());
                        }
                    }
                }
                changed = self.shutdown.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *self.shutdown.borrow() {
                        tracing::info!("Payment-result consumer stopped");
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle(&self, record: EventRecord) {
        let event = match DomainEvent::decode(&record) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(kind = %record.kind, error = %e, "Failed to decode event");
                return;
            }
        };

        let DomainEvent::PaymentResult(result) = event else {
            tracing::warn!(kind = %record.kind, "Unexpected event kind on payment-result topic");
            return;
        };

        match self.store.apply_result(&result, record).await {
            ResultApplied::Applied(status) => {
                tracing::info!(order_id = %result.order_id, status = %status, "Order settled");
            }
            ResultApplied::Duplicate => {
                tracing::debug!(order_id = %result.order_id, "Duplicate payment result discarded");
            }
            ResultApplied::UnknownOrder => {
                tracing::warn!(order_id = %result.order_id, "Payment result for unknown order");
            }
            ResultApplied::AlreadyTerminal => {
                tracing::warn!(
                    order_id = %result.order_id,
                    "Payment result for an already settled order rejected"
                );
            }
        }
    }
}
