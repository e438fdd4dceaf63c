//! Outbox publisher loop.

use orderwire_core::bus::EventBus;
use orderwire_core::message::MessageId;
use orderwire_core::store::{OutboxSource, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Drains unpublished outbox rows from a store to the event bus on a fixed
/// poll cadence.
///
/// One publisher runs per service for the process lifetime. The loop is bound
/// to a shutdown signal; dropping the returned [`watch::Sender`] or sending
/// `true` through it stops the loop, interrupting an in-flight wait.
///
/// # Failure Semantics
///
/// A publish the bus does not confirm leaves its row unprocessed; the row is
/// retried on every subsequent cycle, indefinitely. There is no
/// dead-lettering. Rows whose publish was confirmed are marked processed in
/// the same cycle.
///
/// # Example
///
/// ```ignore
/// let (publisher, shutdown) = OutboxPublisher::new(
///     Arc::clone(&store) as Arc<dyn OutboxSource>,
///     Arc::clone(&bus),
///     "orders",
///     Duration::from_millis(500),
/// );
/// let handle = tokio::spawn(publisher.run());
///
/// // On shutdown:
/// shutdown.send(true).ok();
/// handle.await??;
/// ```
pub struct OutboxPublisher {
    source: Arc<dyn OutboxSource>,
    bus: Arc<dyn EventBus>,
    /// Service label used in logs and metrics.
    service: String,
    /// Fixed poll delay between drain cycles.
    interval: Duration,
    /// Shutdown signal.
    shutdown: watch::Receiver<bool>,
}

impl OutboxPublisher {
    /// Creates a publisher and the sender half of its shutdown signal.
    #[must_use]
    pub fn new(
        source: Arc<dyn OutboxSource>,
        bus: Arc<dyn EventBus>,
        service: impl Into<String>,
        interval: Duration,
    ) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let publisher = Self {
            source,
            bus,
            service: service.into(),
            interval,
            shutdown: shutdown_rx,
        };

        (publisher, shutdown_tx)
    }

    /// Runs the poll loop until the shutdown signal fires.
    ///
    /// Cancellation is cooperative and interrupts both the inter-cycle wait
    /// and an in-flight flush. Cycle errors (store unreadable, bus refusing a
    /// publish) are logged and the loop keeps going; transient failures are
    /// recoverable by construction because unconfirmed rows stay unprocessed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] only if marking confirmed rows as published
    /// fails, which means the store itself is gone and the loop cannot uphold
    /// its contract.
    pub async fn run(self) -> Result<(), StoreError> {
        let mut cancel = self.shutdown.clone();
        tracing::info!(
            service = %self.service,
            interval_ms = self.interval.as_millis(),
            "Outbox publisher started"
        );

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    tokio::select! {
                        result = self.flush() => result?,
                        changed = cancel.changed() => {
                            // A dropped sender counts as shutdown too.
                            if changed.is_err() || *cancel.borrow() {
                                tracing::info!(service = %self.service, "Outbox publisher stopped");
                                return Ok(());
                            }
                        }
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!(service = %self.service, "Outbox publisher stopped");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs one drain cycle: fetch unpublished rows, publish each, mark the
    /// confirmed ones processed.
    ///
    /// Public so tests and callers that wake on a local write can drive a
    /// cycle without waiting out the poll interval.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read or the confirmed
    /// rows cannot be marked.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let pending = self.source.unpublished().await?;
        if pending.is_empty() {
            return Ok(());
        }

        let mut confirmed: Vec<MessageId> = Vec::with_capacity(pending.len());
        for message in &pending {
            let topic = message.record.kind.topic();
            match self.bus.publish(topic, &message.record).await {
                Ok(()) => {
                    tracing::debug!(
                        service = %self.service,
                        message_id = %message.id,
                        topic = topic,
                        "Outbox row published"
                    );
                    confirmed.push(message.id);
                }
                Err(e) => {
                    // Not confirmed: the row stays unprocessed and is retried
                    // on the next cycle.
                    tracing::warn!(
                        service = %self.service,
                        message_id = %message.id,
                        topic = topic,
                        error = %e,
                        "Publish failed, row will be retried"
                    );
                    metrics::counter!("outbox.publish_failures").increment(1);
                }
            }
        }

        if !confirmed.is_empty() {
            self.source.mark_published(&confirmed).await?;
            metrics::counter!("outbox.published").increment(confirmed.len() as u64);
            tracing::info!(
                service = %self.service,
                published = confirmed.len(),
                pending = pending.len() - confirmed.len(),
                "Outbox flush cycle complete"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use orderwire_bus::InMemoryEventBus;
    use orderwire_core::bus::{EventBusError, EventStream};
    use orderwire_core::event::{DomainEvent, EventRecord, PaymentResult};
    use orderwire_core::message::OutboxMessage;
    use orderwire_core::order::OrderId;
    use orderwire_store::Journal;
    use futures::StreamExt;
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::Mutex;

    /// Journal behind a lock, standing in for a service store.
    #[derive(Default)]
    struct MemorySource {
        journal: Mutex<Journal>,
    }

    impl MemorySource {
        async fn append(&self, record: EventRecord) -> MessageId {
            self.journal.lock().await.append_outbox(record)
        }

        async fn unpublished_count(&self) -> usize {
            self.journal.lock().await.unpublished().len()
        }
    }

    impl OutboxSource for MemorySource {
        fn unpublished(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<OutboxMessage>, StoreError>> + Send + '_>>
        {
            Box::pin(async move { Ok(self.journal.lock().await.unpublished()) })
        }

        fn mark_published(
            &self,
            ids: &[MessageId],
        ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
            let ids = ids.to_vec();
            Box::pin(async move {
                self.journal.lock().await.mark_published(&ids);
                Ok(())
            })
        }
    }

    /// Bus that refuses every publish.
    struct DownBus;

    impl EventBus for DownBus {
        fn publish(
            &self,
            topic: &str,
            _record: &EventRecord,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
            let topic = topic.to_string();
            Box::pin(async move {
                Err(EventBusError::PublishFailed {
                    topic,
                    reason: "broker unreachable".to_string(),
                })
            })
        }

        fn subscribe(
            &self,
            _topics: &[&str],
        ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>
        {
            Box::pin(async move { Ok(Box::pin(futures::stream::empty()) as EventStream) })
        }
    }

    fn result_record() -> EventRecord {
        DomainEvent::PaymentResult(PaymentResult::succeeded(OrderId::new()))
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn flush_publishes_and_marks_confirmed_rows() {
        let source = Arc::new(MemorySource::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let mut stream = bus.subscribe(&["payment-result"]).await.unwrap();

        let record = result_record();
        source.append(record.clone()).await;

        let (publisher, _shutdown) = OutboxPublisher::new(
            Arc::clone(&source) as Arc<dyn OutboxSource>,
            bus,
            "test",
            Duration::from_millis(10),
        );
        publisher.flush().await.unwrap();

        assert_eq!(source.unpublished_count().await, 0);
        assert_eq!(stream.next().await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn unconfirmed_rows_stay_unprocessed() {
        let source = Arc::new(MemorySource::default());
        source.append(result_record()).await;

        let (publisher, _shutdown) = OutboxPublisher::new(
            Arc::clone(&source) as Arc<dyn OutboxSource>,
            Arc::new(DownBus),
            "test",
            Duration::from_millis(10),
        );

        // Repeated cycles against a dead broker never mark anything.
        publisher.flush().await.unwrap();
        publisher.flush().await.unwrap();
        assert_eq!(source.unpublished_count().await, 1);
    }

    #[tokio::test]
    async fn rows_survive_broker_outage_and_publish_on_recovery() {
        let source = Arc::new(MemorySource::default());
        let record = result_record();
        source.append(record.clone()).await;

        // Broker down: row is retried and stays pending.
        let (down, _s1) = OutboxPublisher::new(
            Arc::clone(&source) as Arc<dyn OutboxSource>,
            Arc::new(DownBus),
            "test",
            Duration::from_millis(10),
        );
        down.flush().await.unwrap();
        assert_eq!(source.unpublished_count().await, 1);

        // Broker healthy again: the same loop discipline drains the row.
        let bus = Arc::new(InMemoryEventBus::new());
        let mut stream = bus.subscribe(&["payment-result"]).await.unwrap();
        let (up, _s2) = OutboxPublisher::new(
            Arc::clone(&source) as Arc<dyn OutboxSource>,
            bus,
            "test",
            Duration::from_millis(10),
        );
        up.flush().await.unwrap();

        assert_eq!(source.unpublished_count().await, 0);
        assert_eq!(stream.next().await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let source = Arc::new(MemorySource::default());
        let (publisher, shutdown) = OutboxPublisher::new(
            Arc::clone(&source) as Arc<dyn OutboxSource>,
            Arc::new(InMemoryEventBus::new()),
            "test",
            Duration::from_millis(5),
        );

        let handle = tokio::spawn(publisher.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("publisher should stop promptly")
            .expect("task should join")
            .expect("run should return cleanly");
    }
}
