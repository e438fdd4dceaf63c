//! # Orderwire Payments
//!
//! The payment service: manages accounts over HTTP, records incoming
//! `payment-task` events into an idempotent inbox, evaluates them against
//! account balances, and emits `payment-result` events through the same
//! transactional outbox mechanism the order side uses.
//!
//! The moving parts share one [`PaymentStore`]:
//!
//! - the Axum router ([`router::account_router`]) serving the account surface,
//! - the inbound consumer ([`consumer::TaskConsumer`]) performing idempotent
//!   receipt of payment tasks,
//! - the settlement processor ([`processor::SettlementProcessor`]), the
//!   background loop that applies the decision table in
//!   [`settlement`] and commits outcome, debit, and result event atomically,
//! - the store itself ([`store::PaymentStore`]), which is also the
//!   [`OutboxSource`](orderwire_core::OutboxSource) drained by the outbox
//!   publisher.

pub mod consumer;
pub mod handlers;
pub mod processor;
pub mod router;
pub mod settlement;
pub mod store;

pub use consumer::TaskConsumer;
pub use processor::SettlementProcessor;
pub use router::account_router;
pub use store::PaymentStore;
