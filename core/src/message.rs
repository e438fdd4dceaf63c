//! Durable outbox and inbox records.
//!
//! These rows are the evidence that an event was produced or received. They
//! are append-only: a row is created once, its `processed` flag transitions
//! `false -> true` exactly once (enforced by the store), and rows are never
//! deleted or otherwise updated.

use crate::event::{CorrelationKey, EventRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an outbox or inbox row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a fresh random message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event awaiting publication to the broker.
///
/// Appended in the same atomic store operation as the business mutation it
/// announces, then drained by the outbox publisher loop. `processed` is set
/// only after the broker has confirmed the publish, so a crash in between
/// leads to republication, never to a lost event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboxMessage {
    /// Row identifier.
    pub id: MessageId,
    /// When the row was created.
    pub occurred_at: DateTime<Utc>,
    /// The serialized event.
    pub record: EventRecord,
    /// Whether the broker has confirmed publication.
    pub processed: bool,
}

impl OutboxMessage {
    /// Creates an unprocessed outbox row for an event record.
    #[must_use]
    pub fn new(record: EventRecord) -> Self {
        Self {
            id: MessageId::new(),
            occurred_at: Utc::now(),
            record,
            processed: false,
        }
    }
}

/// A received event awaiting business processing.
///
/// Appended by an inbound consumer after the correlation-key dedup check;
/// `processed` is set when the business effect has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboxMessage {
    /// Row identifier.
    pub id: MessageId,
    /// When the row was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Logical identity used for deduplication.
    pub correlation: CorrelationKey,
    /// The serialized event.
    pub record: EventRecord,
    /// Whether the business effect has been applied.
    pub processed: bool,
}

impl InboxMessage {
    /// Creates an unprocessed inbox row for a received event.
    #[must_use]
    pub fn new(correlation: CorrelationKey, record: EventRecord) -> Self {
        Self {
            id: MessageId::new(),
            occurred_at: Utc::now(),
            correlation,
            record,
            processed: false,
        }
    }
}
