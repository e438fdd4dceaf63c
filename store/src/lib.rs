//! # Orderwire Store
//!
//! The append-only outbox/inbox journal shared by the orderwire services.
//!
//! Each service embeds a [`Journal`] next to its business tables behind one
//! writer lock, so a business mutation and the journal rows it produces are
//! committed together or not at all (the transactional-writer guarantee).
//! The journal itself enforces the record-level invariants:
//!
//! - rows are append-only and never deleted,
//! - the `processed` flag transitions `false -> true` exactly once,
//! - at most one inbox row exists per correlation key, checked against an
//!   index in the same operation as the append, so two concurrent deliveries
//!   of the same event cannot both be accepted.

mod journal;

pub use journal::{InboxReceipt, Journal};
