//! Order domain model.
//!
//! Orders are created by the order service and mutated only by the outcome of
//! a payment attempt: the status transition `New -> {Finished, Cancelled}` is
//! one-way and terminal.

use crate::account::UserId;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a fresh random order identifier.
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

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an order in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been submitted and is awaiting a payment outcome.
    New,
    /// Payment succeeded.
    Finished,
    /// Payment failed.
    Cancelled,
}

impl OrderStatus {
    /// Whether the order has reached a terminal state.
    ///
    /// Terminal orders never change status again; a later payment result for
    /// the same order is rejected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Finished => write!(f, "Finished"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// An order placed by a user.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// User who placed the order.
    pub user_id: UserId,
    /// Amount to charge, in cents.
    pub amount: Money,
    /// Free-form description.
    pub description: String,
    /// Current lifecycle status.
    pub status: OrderStatus,
}

impl Order {
    /// Creates a new order in the `New` status.
    #[must_use]
    pub fn new(user_id: UserId, amount: Money, description: String) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            amount,
            description,
            status: OrderStatus::New,
        }
    }
}
