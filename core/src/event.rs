//! Event contract shared by the order and payment services.
//!
//! Events represent facts that crossed a service boundary and are immutable.
//! The serialized payload is a versioned external contract: a consumer must
//! be able to decode it without running the same code as the producer, so
//! payloads are JSON and every kind carries a versioned tag (for example
//! `payment-task.v1`).
//!
//! # Design
//!
//! The set of event kinds is closed. [`EventKind`] is an exhaustive sum type
//! and [`DomainEvent::decode`] matches on it, so adding a kind is a compile
//! error until every dispatch site handles it. There is no string comparison
//! with a silent fallthrough.
//!
//! Duplicate deliveries are identified by a [`CorrelationKey`] extracted from
//! the payload's domain fields (order id + event kind), never from a
//! transport-assigned message id, which is not stable across redelivery.
//!
//! # Example
//!
//! ```
//! use orderwire_core::event::{DomainEvent, EventKind, PaymentTask};
//! use orderwire_core::{Money, OrderId, UserId};
//!
//! let task = DomainEvent::PaymentTask(PaymentTask {
//!     order_id: OrderId::new(),
//!     user_id: UserId::new(),
//!     amount: Money::from_cents(400),
//! });
//!
//! let record = task.encode().expect("encoding should succeed");
//! assert_eq!(record.kind, EventKind::PaymentTask);
//!
//! let decoded = DomainEvent::decode(&record).expect("decoding should succeed");
//! assert_eq!(decoded.correlation_key(), task.correlation_key());
//! ```

use crate::account::UserId;
use crate::money::Money;
use crate::order::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while encoding or decoding events.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize an event payload.
    #[error("failed to serialize {kind} payload: {reason}")]
    Serialization {
        /// The kind that failed to serialize.
        kind: EventKind,
        /// The underlying serde error.
        reason: String,
    },

    /// Failed to deserialize an event payload.
    #[error("failed to deserialize {kind} payload: {reason}")]
    Deserialization {
        /// The kind the payload claimed to be.
        kind: EventKind,
        /// The underlying serde error.
        reason: String,
    },
}

/// The closed set of event kinds that cross service boundaries.
///
/// Each kind maps to a versioned wire tag (the serde representation) and to
/// the broker topic it is published under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A request to charge a user for an order.
    #[serde(rename = "payment-task.v1")]
    PaymentTask,
    /// The outcome of a payment attempt.
    #[serde(rename = "payment-result.v1")]
    PaymentResult,
}

impl EventKind {
    /// Returns the versioned wire tag for this kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::PaymentTask => "payment-task.v1",
            Self::PaymentResult => "payment-result.v1",
        }
    }

    /// Returns the broker topic this kind is published under.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::PaymentTask => "payment-task",
            Self::PaymentResult => "payment-result",
        }
    }

    /// Looks up a kind by its versioned wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "payment-task.v1" => Some(Self::PaymentTask),
            "payment-result.v1" => Some(Self::PaymentResult),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Payload describing "attempt to charge this user for this order".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTask {
    /// The order being paid for.
    pub order_id: OrderId,
    /// The user to charge.
    pub user_id: UserId,
    /// Requested amount in cents.
    pub amount: Money,
}

/// Payload describing the outcome of a payment attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    /// The order the outcome is for.
    pub order_id: OrderId,
    /// Whether the charge succeeded.
    pub success: bool,
    /// Failure reason, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PaymentResult {
    /// Builds a successful outcome for an order.
    #[must_use]
    pub const fn succeeded(order_id: OrderId) -> Self {
        Self {
            order_id,
            success: true,
            reason: None,
        }
    }

    /// Builds a failed outcome with a reason.
    #[must_use]
    pub fn failed(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// Stable logical identity of an event, used for inbox deduplication.
///
/// Derived from the payload's domain key (order id) plus the event kind, so
/// the same fact redelivered by the transport always maps to the same key,
/// while unrelated payloads can never collide.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    /// The event kind.
    pub kind: EventKind,
    /// The order the event is about.
    pub order_id: OrderId,
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.order_id)
    }
}

/// A serialized event ready for the outbox, the inbox, or the wire.
///
/// Contains the exhaustive kind tag and the JSON-encoded payload bytes. This
/// is the shape stored in outbox/inbox rows and carried by the event bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The event kind (serialized as its versioned tag).
    pub kind: EventKind,
    /// JSON-encoded payload bytes.
    pub payload: Vec<u8>,
}

impl EventRecord {
    /// Creates a record from a kind and payload bytes.
    #[must_use]
    pub const fn new(kind: EventKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventRecord {{ kind: {}, size: {} bytes }}", self.kind, self.payload.len())
    }
}

/// Tagged union over every event that crosses a service boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    /// A request to charge a user for an order.
    PaymentTask(PaymentTask),
    /// The outcome of a payment attempt.
    PaymentResult(PaymentResult),
}

impl DomainEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PaymentTask(_) => EventKind::PaymentTask,
            Self::PaymentResult(_) => EventKind::PaymentResult,
        }
    }

    /// Returns the stable logical identity of this event.
    #[must_use]
    pub const fn correlation_key(&self) -> CorrelationKey {
        let order_id = match self {
            Self::PaymentTask(task) => task.order_id,
            Self::PaymentResult(result) => result.order_id,
        };
        CorrelationKey {
            kind: self.kind(),
            order_id,
        }
    }

    /// Serializes this event into an [`EventRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the payload cannot be encoded
    /// as JSON, which is not expected for these types.
    pub fn encode(&self) -> Result<EventRecord, EventError> {
        let kind = self.kind();
        let payload = match self {
            Self::PaymentTask(task) => serde_json::to_vec(task),
            Self::PaymentResult(result) => serde_json::to_vec(result),
        }
        .map_err(|e| EventError::Serialization {
            kind,
            reason: e.to_string(),
        })?;
        Ok(EventRecord::new(kind, payload))
    }

    /// Deserializes an event from an [`EventRecord`].
    ///
    /// The match on the record's kind is exhaustive, so every known kind has
    /// a decoder and unknown kinds cannot exist past deserialization of the
    /// record itself.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] if the payload bytes do not
    /// decode as the kind's schema.
    pub fn decode(record: &EventRecord) -> Result<Self, EventError> {
        let deserialization = |e: serde_json::Error| EventError::Deserialization {
            kind: record.kind,
            reason: e.to_string(),
        };
        match record.kind {
            EventKind::PaymentTask => serde_json::from_slice(&record.payload)
                .map(Self::PaymentTask)
                .map_err(deserialization),
            EventKind::PaymentResult => serde_json::from_slice(&record.payload)
                .map(Self::PaymentResult)
                .map_err(deserialization),
        }
    }
}
