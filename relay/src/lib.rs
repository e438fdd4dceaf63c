//! # Orderwire Relay
//!
//! The outbox publisher: a background loop, one per service, that drains
//! unpublished outbox rows to the event bus.
//!
//! ```text
//! ┌──────────────┐   unpublished    ┌─────────────────┐
//! │ OutboxSource │ ───────────────► │ OutboxPublisher │
//! │ (service     │ ◄─────────────── │  (poll loop)    │
//! │  store)      │  mark_published  └────────┬────────┘
//! └──────────────┘                           │ publish
//!                                            ▼
//!                                      ┌──────────┐
//!                                      │ EventBus │
//!                                      └──────────┘
//! ```
//!
//! A row is marked processed only after the bus has confirmed the publish, so
//! a crash between "published" and "flag committed" leaves the row
//! unprocessed and it is republished on the next cycle. Delivery is therefore
//! at-least-once, never at-most-once, and downstream consumers deduplicate.

mod publisher;

pub use publisher::OutboxPublisher;
