//! Transactional order store.
//!
//! Business tables and the outbox/inbox journal live behind one writer lock,
//! so a state change and the event row announcing it commit together or not
//! at all. This is what avoids the dual-write problem: there is no window in
//! which the order exists but its payment task could be lost, or vice versa.

use orderwire_core::event::{CorrelationKey, DomainEvent, EventKind, EventRecord, PaymentResult, PaymentTask};
use orderwire_core::message::{MessageId, OutboxMessage};
use orderwire_core::money::Money;
use orderwire_core::order::{Order, OrderId, OrderStatus};
use orderwire_core::store::{OutboxSource, StoreError};
use orderwire_core::account::UserId;
use orderwire_store::{InboxReceipt, Journal};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

/// A request to create an order.
#[derive(Clone, Debug)]
pub struct NewOrder {
    /// User placing the order.
    pub user_id: UserId,
    /// Amount to charge, in cents.
    pub amount: Money,
    /// Free-form description.
    pub description: String,
}

/// Outcome of applying a received payment result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultApplied {
    /// The order transitioned to the given terminal status.
    Applied(OrderStatus),
    /// Redelivery absorbed by the inbox; no effect.
    Duplicate,
    /// No order with that identity exists; recorded but no effect.
    UnknownOrder,
    /// The order already reached a terminal status; the result was rejected.
    AlreadyTerminal,
}

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    journal: Journal,
}

/// In-memory order store with read-committed isolation.
///
/// Reads take the shared lock and see only committed state; every combined
/// mutation takes the exclusive lock.
#[derive(Default)]
pub struct OrderStore {
    inner: RwLock<Inner>,
}

impl OrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an order and its `payment-task` outbox row as one atomic unit.
    ///
    /// On success both are durable; on failure neither is applied and the
    /// caller may retry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] if the payment task cannot be encoded,
    /// in which case nothing is mutated.
    pub async fn submit(&self, new_order: NewOrder) -> Result<Order, StoreError> {
        let order = Order::new(new_order.user_id, new_order.amount, new_order.description);
        let task = DomainEvent::PaymentTask(PaymentTask {
            order_id: order.id,
            user_id: order.user_id,
            amount: order.amount,
        });
        // Encode before taking the lock; a codec failure must leave no trace.
        let record = task.encode()?;

        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        inner.journal.append_outbox(record);

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            amount = %order.amount,
            "Order submitted"
        );
        Ok(order)
    }

    /// Looks up an order by id.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.inner.read().await.orders.get(&id).cloned()
    }

    /// Returns all orders.
    pub async fn orders(&self) -> Vec<Order> {
        self.inner.read().await.orders.values().cloned().collect()
    }

    /// Applies a received payment result: idempotent receipt and status
    /// transition in one atomic operation.
    ///
    /// The inbox row is recorded under the result's correlation key; a
    /// duplicate delivery is discarded before any business effect. The
    /// status transition `New -> {Finished, Cancelled}` is one-way: results
    /// for orders already settled are rejected.
    pub async fn apply_result(&self, result: &PaymentResult, record: EventRecord) -> ResultApplied {
        let correlation = CorrelationKey {
            kind: EventKind::PaymentResult,
            order_id: result.order_id,
        };

        let mut inner = self.inner.write().await;
        let InboxReceipt::Recorded(row) = inner.journal.record_inbox(correlation, record) else {
            return ResultApplied::Duplicate;
        };

        let applied = match inner.orders.get_mut(&result.order_id) {
            None => ResultApplied::UnknownOrder,
            Some(order) if order.status.is_terminal() => ResultApplied::AlreadyTerminal,
            Some(order) => {
                order.status = if result.success {
                    OrderStatus::Finished
                } else {
                    OrderStatus::Cancelled
                };
                ResultApplied::Applied(order.status)
            }
        };

        // The row is processed either way: the event was received and its
        // disposition decided.
        inner.journal.mark_inbox_processed(row);
        applied
    }
}

impl OutboxSource for OrderStore {
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
