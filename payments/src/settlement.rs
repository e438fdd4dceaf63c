//! Payment evaluation rules.
//!
//! The decision table is a pure function so it can be tested at memory speed;
//! the store applies whatever it decides under the account lock, which is
//! what keeps concurrent check-then-debit sequences from overdrawing an
//! account.

use orderwire_core::account::Account;
use orderwire_core::event::PaymentTask;

/// Failure reason reported when the user has no account.
pub const NO_ACCOUNT: &str = "No account";

/// Failure reason reported when the balance cannot cover the task.
pub const INSUFFICIENT_FUNDS: &str = "Insufficient funds";

/// Outcome of evaluating a payment task against an account.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Debit the requested amount and report success.
    Approve,
    /// Report failure with the given reason; no mutation.
    Decline(&'static str),
}

/// Evaluates a payment task, in priority order: a missing account wins over
/// an insufficient balance, and only a sufficient balance approves.
#[must_use]
pub fn evaluate(account: Option<&Account>, task: &PaymentTask) -> Decision {
    match account {
        None => Decision::Decline(NO_ACCOUNT),
        Some(account) if account.balance < task.amount => Decision::Decline(INSUFFICIENT_FUNDS),
        Some(_) => Decision::Approve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderwire_core::account::UserId;
    use orderwire_core::money::Money;
    use orderwire_core::order::OrderId;

    fn task(amount: i64) -> PaymentTask {
        PaymentTask {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            amount: Money::from_cents(amount),
        }
    }

    fn account(balance: i64) -> Account {
        Account {
            user_id: UserId::new(),
            balance: Money::from_cents(balance),
        }
    }

    #[test]
    fn missing_account_declines_first() {
        assert_eq!(evaluate(None, &task(0)), Decision::Decline(NO_ACCOUNT));
        assert_eq!(evaluate(None, &task(1500)), Decision::Decline(NO_ACCOUNT));
    }

    #[test]
    fn short_balance_declines() {
        let acc = account(1000);
        assert_eq!(
            evaluate(Some(&acc), &task(1500)),
            Decision::Decline(INSUFFICIENT_FUNDS)
        );
    }

    #[test]
    fn sufficient_balance_approves() {
        let acc = account(1000);
        assert_eq!(evaluate(Some(&acc), &task(400)), Decision::Approve);
    }

    #[test]
    fn exact_balance_approves() {
        let acc = account(1000);
        assert_eq!(evaluate(Some(&acc), &task(1000)), Decision::Approve);
    }
}
