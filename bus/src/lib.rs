//! In-process event bus implementation for orderwire.
//!
//! This crate provides an in-memory, broadcast-channel-backed implementation
//! of the [`EventBus`] trait from `orderwire-core`. It is the reference
//! transport used by the demo stack and the integration tests; a
//! Kafka-compatible or AMQP implementation would slot in behind the same
//! trait without touching the services.
//!
//! # Delivery Semantics
//!
//! **At-least-once**, in cooperation with the outbox:
//!
//! - a publish is *accepted* only if at least one live subscription for the
//!   topic received the event. With nobody subscribed the publish fails, the
//!   outbox row stays unprocessed, and the publisher retries it on the next
//!   cycle. Consumers that attach late therefore still see every event.
//! - every live subscription receives its own copy of each event (fan-out).
//! - a slow subscriber that overruns its buffer observes a transport error
//!   in-band and continues with the retained events.
//!
//! # Example
//!
//! ```
//! use orderwire_bus::InMemoryEventBus;
//! use orderwire_core::event::{DomainEvent, EventKind, PaymentResult};
//! use orderwire_core::{EventBus, OrderId};
//! use futures::StreamExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = InMemoryEventBus::new();
//! let mut stream = bus.subscribe(&["payment-result"]).await?;
//!
//! let event = DomainEvent::PaymentResult(PaymentResult::succeeded(OrderId::new()));
//! bus.publish("payment-result", &event.encode()?).await?;
//!
//! let received = stream.next().await.expect("stream open")?;
//! assert_eq!(received.kind, EventKind::PaymentResult);
//! # Ok(())
//! # }
//! ```

use orderwire_core::bus::{EventBus, EventBusError, EventStream};
use orderwire_core::event::EventRecord;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Default per-topic buffer capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// In-memory event bus backed by one broadcast channel per topic.
///
/// Cheap to clone via [`Arc`]; all services in a process share one instance.
pub struct InMemoryEventBus {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<EventRecord>>>>,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Creates a bus with the default per-topic buffer capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus with an explicit per-topic buffer capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    async fn sender_for(&self, topic: &str) -> broadcast::Sender<EventRecord> {
        {
            let topics = self.topics.read().await;
            if let Some(sender) = topics.get(topic) {
                return sender.clone();
            }
        }

        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        record: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let record = record.clone();

        Box::pin(async move {
            let sender = {
                let topics = self.topics.read().await;
                topics.get(&topic).cloned()
            };

            let delivered = sender.and_then(|s| s.send(record).ok());
            match delivered {
                Some(receiver_count) => {
                    tracing::debug!(
                        topic = %topic,
                        receivers = receiver_count,
                        "Event published"
                    );
                    Ok(())
                }
                // Nobody is listening: refuse the publish so the outbox row
                // stays unprocessed and is retried once a consumer attaches.
                None => Err(EventBusError::PublishFailed {
                    topic,
                    reason: "no live subscriptions".to_string(),
                }),
            }
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let (tx, rx) = mpsc::channel(self.capacity);

            for topic in &topics {
                let mut receiver = self.sender_for(topic).await.subscribe();
                let tx = tx.clone();
                let topic = topic.clone();

                tokio::spawn(async move {
                    loop {
                        match receiver.recv().await {
                            Ok(record) => {
                                if tx.send(Ok(record)).await.is_err() {
                                    break; // Subscriber dropped the stream
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                tracing::warn!(
                                    topic = %topic,
                                    missed = missed,
                                    "Subscriber lagged, events were dropped from its buffer"
                                );
                                let err = EventBusError::TransportError(format!(
                                    "subscriber lagged on topic '{topic}', missed {missed} events"
                                ));
                                if tx.send(Err(err)).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }

                    tracing::debug!(topic = %topic, "Subscription task exiting");
                });
            }

            tracing::info!(topics = ?topics, "Subscribed to topics");

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}
