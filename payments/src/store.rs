//! Transactional payment store.
//!
//! Accounts and the outbox/inbox journal live behind one writer lock. The
//! lock is also what serializes settlement: two concurrent evaluations of the
//! same account cannot both pass the balance check before either commits a
//! debit, so an account can never be overdrawn by racing tasks.

use crate::settlement::{self, Decision};
use orderwire_core::account::{Account, UserId};
use orderwire_core::event::{DomainEvent, EventKind, EventRecord, PaymentResult, PaymentTask};
use orderwire_core::message::{MessageId, OutboxMessage};
use orderwire_core::money::Money;
use orderwire_core::store::{OutboxSource, StoreError};
use orderwire_store::{InboxReceipt, Journal};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    accounts: HashMap<UserId, Account>,
    journal: Journal,
}

/// In-memory payment store with read-committed isolation and a uniqueness
/// constraint on account identity.
#[derive(Default)]
pub struct PaymentStore {
    inner: RwLock<Inner>,
}

impl PaymentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account for a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAccount`] if the user already has an
    /// account; the existing account is not mutated.
    pub async fn open_account(&self, user: UserId) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&user) {
            return Err(StoreError::DuplicateAccount { user });
        }

        let account = Account::new(user);
        inner.accounts.insert(user, account.clone());
        tracing::info!(user_id = %user, "Account opened");
        Ok(account)
    }

    /// Adds funds to a user's account and returns the updated account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AccountNotFound`] if the user has no account.
    pub async fn top_up(&self, user: UserId, amount: Money) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&user)
            .ok_or(StoreError::AccountNotFound { user })?;

        account.balance = account.balance.saturating_add(amount);
        tracing::info!(user_id = %user, balance = %account.balance, "Account topped up");
        Ok(account.clone())
    }

    /// Looks up an account by user.
    pub async fn account(&self, user: UserId) -> Option<Account> {
        self.inner.read().await.accounts.get(&user).cloned()
    }

    /// Records a received payment task into the inbox, deduplicating on its
    /// correlation key. The identity check and the append are one atomic
    /// operation, so two concurrent deliveries of the same event cannot both
    /// be accepted.
    pub async fn record_task(&self, task: &PaymentTask, record: EventRecord) -> InboxReceipt {
        let correlation = DomainEvent::PaymentTask(task.clone()).correlation_key();
        self.inner.write().await.journal.record_inbox(correlation, record)
    }

    /// Returns the ids of unprocessed payment-task inbox rows, oldest first.
    pub async fn pending_tasks(&self) -> Vec<MessageId> {
        self.inner.read().await.journal.pending_inbox(EventKind::PaymentTask)
    }

    /// Settles one payment task: evaluates the decision table, applies the
    /// debit if approved, appends the `payment-result` outbox row, and marks
    /// the inbox row processed, all in one atomic operation.
    ///
    /// Returns `None` if the row was already processed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MessageNotFound`] if no inbox row has that id.
    /// - [`StoreError::Codec`] if the row's payload does not decode; nothing
    ///   is mutated, and the caller decides the row's fate (see
    ///   [`discard_task`](Self::discard_task)).
    pub async fn settle(&self, id: MessageId) -> Result<Option<PaymentResult>, StoreError> {
        let mut inner = self.inner.write().await;

        let (record, processed) = {
            let message = inner
                .journal
                .inbox_message(id)
                .ok_or(StoreError::MessageNotFound { id })?;
            (message.record.clone(), message.processed)
        };
        if processed {
            return Ok(None);
        }

        let DomainEvent::PaymentTask(task) = DomainEvent::decode(&record)? else {
            // pending_tasks only yields payment-task rows; leave anything
            // else untouched.
            return Ok(None);
        };

        let decision = settlement::evaluate(inner.accounts.get(&task.user_id), &task);
        let result = match decision {
            Decision::Approve => PaymentResult::succeeded(task.order_id),
            Decision::Decline(reason) => PaymentResult::failed(task.order_id, reason),
        };

        // Encode before mutating anything so a codec failure aborts cleanly.
        let out_record = DomainEvent::PaymentResult(result.clone()).encode()?;

        if decision == Decision::Approve {
            if let Some(account) = inner.accounts.get_mut(&task.user_id) {
                if let Some(balance) = account.balance.checked_sub(task.amount) {
                    account.balance = balance;
                }
            }
        }

        inner.journal.append_outbox(out_record);
        inner.journal.mark_inbox_processed(id);

        tracing::info!(
            order_id = %result.order_id,
            user_id = %task.user_id,
            success = result.success,
            reason = result.reason.as_deref().unwrap_or(""),
            "Payment task settled"
        );
        Ok(Some(result))
    }

    /// Marks an undecodable inbox row processed without a business effect.
    ///
    /// Retrying cannot fix a malformed payload, so the processor discards it
    /// instead of wedging the loop. Returns whether the flag transitioned.
    pub async fn discard_task(&self, id: MessageId) -> bool {
        self.inner.write().await.journal.mark_inbox_processed(id)
    }
}

impl OutboxSource for PaymentStore {
    fn unpublished(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OutboxMessage>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.inner.read().await.journal.unpublished()) })
    }

    fn mark_published(
        &self,
        ids: &[MessageId],
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let ids = ids.to_vec();
        Box::pin(async move {
            self.inner.write().await.journal.mark_published(&ids);
            Ok(())
        })
    }
}
