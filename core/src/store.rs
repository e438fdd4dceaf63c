//! Store error taxonomy and the outbox drain contract.

use crate::account::UserId;
use crate::event::EventError;
use crate::message::{MessageId, OutboxMessage};
use crate::order::OrderId;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors surfaced by the stores.
///
/// Validation and not-found errors map to client-facing HTTP errors; codec
/// errors indicate a row whose payload does not match its kind's schema.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A second registration for a user that already has an account.
    ///
    /// The existing account is left untouched.
    #[error("account already exists for user {user}")]
    DuplicateAccount {
        /// The user with the existing account.
        user: UserId,
    },

    /// No account exists for the user.
    #[error("no account for user {user}")]
    AccountNotFound {
        /// The unknown user.
        user: UserId,
    },

    /// No order exists with the given identity.
    #[error("order {order} not found")]
    OrderNotFound {
        /// The unknown order.
        order: OrderId,
    },

    /// No outbox/inbox row exists with the given identity.
    #[error("message {id} not found")]
    MessageNotFound {
        /// The unknown row.
        id: MessageId,
    },

    /// An event payload failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] EventError),
}

/// A store that owns an outbox table drained by the publisher loop.
///
/// Both service stores implement this, so a single publisher implementation
/// serves every service.
///
/// # Dyn Compatibility
///
/// Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// the publisher can hold an `Arc<dyn OutboxSource>`.
pub trait OutboxSource: Send + Sync {
    /// Returns all outbox rows not yet confirmed as published.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    fn unpublished(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OutboxMessage>, StoreError>> + Send + '_>>;

    /// Marks the given rows as published.
    ///
    /// The flag is monotonic: rows already marked stay marked, and ids that
    /// do not exist are ignored. Callers must only pass ids whose publish the
    /// broker has confirmed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    fn mark_published(
        &self,
        ids: &[MessageId],
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
