//! Event bus abstraction for cross-service communication.
//!
//! Events flow from a service's outbox through the bus to the other
//! service's inbound consumer. The bus provides **at-least-once** delivery:
//! an event may reach a subscriber more than once (the outbox republishes
//! anything the broker did not confirm), so subscribers must be idempotent.
//! No ordering is guaranteed across different event kinds.
//!
//! # Topics
//!
//! Each [`EventKind`](crate::event::EventKind) maps to one topic
//! (`payment-task`, `payment-result`); the publisher derives the topic from
//! the row's kind and consumers subscribe per topic.
//!
//! # Implementations
//!
//! The broker's own transport and connection management are external
//! collaborators; this trait is the contract the core depends on. The
//! `orderwire-bus` crate provides the in-process implementation used by the
//! demo stack and tests.

use crate::event::EventRecord;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to publish an event to a topic.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to topics.
    #[error("subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe.
        topics: Vec<String>,
        /// The reason for failure.
        reason: String,
    },

    /// Network or transport error while receiving.
    #[error("transport error: {0}")]
    TransportError(String),
}

/// Stream of events from subscriptions.
///
/// Each item is a `Result` so transport errors surface in-band without
/// tearing down the subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventRecord, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// the trait can be used as a trait object (`Arc<dyn EventBus>`) shared by
/// the publisher loops and consumers.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// Returning `Ok` means the broker durably accepted the event; only then
    /// may the caller mark the corresponding outbox row processed.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the broker did not accept
    /// the event. The caller must leave the outbox row unprocessed so it is
    /// republished.
    fn publish(
        &self,
        topic: &str,
        record: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a merged stream of events.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// could not be established. At startup this is fatal for the service.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}
