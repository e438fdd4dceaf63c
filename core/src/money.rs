//! Monetary amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Money amount in cents (to avoid floating point issues).
///
/// Serializes as a bare integer, so JSON payloads and API bodies carry
/// amounts as cents.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a new money amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new money amount from dollars (converted to cents).
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Returns the value in cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Adds another amount, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts another amount, returning `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the value in dollars (as floating point, for display only).
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // i64 to f64 precision loss is acceptable for display
    pub fn dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.dollars())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn money_from_cents() {
        let m = Money::from_cents(1234);
        assert_eq!(m.cents(), 1234);
        assert!((m.dollars() - 12.34).abs() < 0.01);
    }

    #[test]
    fn money_from_dollars() {
        let m = Money::from_dollars(12);
        assert_eq!(m.cents(), 1200);
    }

    #[test]
    fn money_checked_sub() {
        let balance = Money::from_cents(1000);
        assert_eq!(balance.checked_sub(Money::from_cents(400)), Some(Money::from_cents(600)));
        assert_eq!(balance.checked_sub(Money::from_cents(1500)), Some(Money::from_cents(-500)));
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
    }

    #[test]
    fn money_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1500)).unwrap();
        assert_eq!(json, "1500");
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
    }
}
