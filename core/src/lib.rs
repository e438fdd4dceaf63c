//! # Orderwire Core
//!
//! Core domain types and contracts for the orderwire system.
//!
//! Orderwire keeps an order producer and a payment ledger consistent across a
//! network boundary without a distributed transaction:
//!
//! - a **transactional outbox** on the write side couples every business
//!   mutation with the event announcing it,
//! - an **idempotent inbox** on the read side absorbs duplicate deliveries,
//! - background publisher/processor loops drive events between the two.
//!
//! This crate is the leaf dependency for everything else. It defines:
//!
//! - the domain model ([`Order`], [`Account`], [`Money`], id newtypes),
//! - the event contract ([`DomainEvent`], [`EventKind`], [`EventRecord`],
//!   [`CorrelationKey`]),
//! - the durable message records ([`OutboxMessage`], [`InboxMessage`]),
//! - the [`EventBus`] trait implemented by broker transports,
//! - the [`OutboxSource`] trait drained by the outbox publisher loop, and the
//!   [`StoreError`] taxonomy shared by the stores.
//!
//! No I/O happens here; transports and stores live in their own crates.

pub mod account;
pub mod bus;
pub mod event;
pub mod message;
pub mod money;
pub mod order;
pub mod store;

pub use account::{Account, UserId};
pub use bus::{EventBus, EventBusError, EventStream};
pub use event::{CorrelationKey, DomainEvent, EventError, EventKind, EventRecord, PaymentResult, PaymentTask};
pub use message::{InboxMessage, MessageId, OutboxMessage};
pub use money::Money;
pub use order::{Order, OrderId, OrderStatus};
pub use store::{OutboxSource, StoreError};
