//! # Orderwire Orders
//!
//! The order service: accepts order submissions over HTTP, couples each
//! submission with a `payment-task` outbox row in one atomic store operation,
//! and applies `payment-result` events coming back from the payment service.
//!
//! The service is three pieces sharing one [`OrderStore`]:
//!
//! - the Axum router ([`router::order_router`]) serving the CRUD surface,
//! - the store itself ([`store::OrderStore`]), which is also the
//!   [`OutboxSource`](orderwire_core::OutboxSource) drained by the outbox
//!   publisher, and
//! - the inbound consumer ([`consumer::ResultConsumer`]) that idempotently
//!   applies payment outcomes.

pub mod consumer;
pub mod handlers;
pub mod router;
pub mod store;

pub use consumer::ResultConsumer;
pub use router::order_router;
pub use store::{NewOrder, OrderStore, ResultApplied};
