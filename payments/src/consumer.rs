//! Inbound consumer for payment tasks.

use crate::store::PaymentStore;
use futures::StreamExt;
use orderwire_core::bus::{EventBus, EventBusError};
use orderwire_core::event::{DomainEvent, EventKind, EventRecord};
use orderwire_store::InboxReceipt;
use std::sync::Arc;
use tokio::sync::watch;

/// Subscribes to the `payment-task` topic and records each task into the
/// inbox exactly once per logical identity.
///
/// This is the point where duplicate delivery is absorbed: an event whose
/// correlation key is already recorded is discarded silently and can never
/// cause a second business effect downstream.
pub struct TaskConsumer {
    store: Arc<PaymentStore>,
    bus: Arc<dyn EventBus>,
    shutdown: watch::Receiver<bool>,
}

impl TaskConsumer {
    /// Creates a consumer and the sender half of its shutdown signal.
    #[must_use]
    pub fn new(store: Arc<PaymentStore>, bus: Arc<dyn EventBus>) -> (Self, watch::Sender<bool>) {
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
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established; at startup this is fatal for the service.
    pub async fn run(mut self) -> Result<(), EventBusError> {
        let topic = EventKind::PaymentTask.topic();
        let mut stream = self.bus.subscribe(&[topic]).await?;
        tracing::info!(topic = topic, "Payment-task consumer started");

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
                        tracing::info!("Payment-task consumer stopped");
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

        let DomainEvent::PaymentTask(task) = event else {
            tracing::warn!(kind = %record.kind, "Unexpected event kind on payment-task topic");
            return;
        };

        match self.store.record_task(&task, record).await {
            InboxReceipt::Recorded(id) => {
                tracing::debug!(
                    order_id = %task.order_id,
                    message_id = %id,
                    "Payment task recorded for settlement"
                );
            }
            InboxReceipt::Duplicate => {
                tracing::debug!(order_id = %task.order_id, "Duplicate payment task discarded");
            }
        }
    }
}
