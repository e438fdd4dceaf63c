//! Account domain model.

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user.
///
/// A user has at most one account; the payment store enforces uniqueness on
/// this key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a fresh random user identifier.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's payment account.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    /// Owning user (unique key).
    pub user_id: UserId,
    /// Current balance in cents.
    pub balance: Money,
}

impl Account {
    /// Creates a new account with a zero balance.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Money::from_cents(0),
        }
    }
}
