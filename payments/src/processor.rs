//! Settlement processor loop.

use crate::store::PaymentStore;
use orderwire_core::store::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Background loop that evaluates unprocessed payment-task inbox rows on a
/// fixed poll cadence.
///
/// Each pending task is settled through [`PaymentStore::settle`], which
/// commits the decision, the balance debit (if any), the `payment-result`
/// outbox row, and the processed flag as one atomic unit. Rows whose payload
/// does not decode are discarded; everything else that fails is retried on
/// the next cycle.
pub struct SettlementProcessor {
    store: Arc<PaymentStore>,
    /// Fixed poll delay between drain cycles.
    interval: Duration,
    /// Shutdown signal.
    shutdown: watch::Receiver<bool>,
}

impl SettlementProcessor {
    /// Creates a processor and the sender half of its shutdown signal.
    #[must_use]
    pub fn new(store: Arc<PaymentStore>, interval: Duration) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let processor = Self {
            store,
            interval,
            shutdown: shutdown_rx,
        };

        (processor, shutdown_tx)
    }

    /// Runs the poll loop until the shutdown signal fires.
    ///
    /// Cancellation is cooperative and interrupts both the inter-cycle wait
    /// and an in-flight drain.
    pub async fn run(self) {
        let mut cancel = self.shutdown.clone();
        tracing::info!(
            interval_ms = self.interval.as_millis(),
            "Settlement processor started"
        );

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {
                    tokio::select! {
                        () = self.drain() => {}
                        changed = cancel.changed() => {
                            // A dropped sender counts as shutdown too.
                            if changed.is_err() || *cancel.borrow() {
                                tracing::info!("Settlement processor stopped");
                                return;
                            }
                        }
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Settlement processor stopped");
                        return;
                    }
                }
            }
        }
    }

    /// Runs one settlement cycle over the currently pending tasks.
    ///
    /// Public so tests and callers that wake on a local write can drive a
    /// cycle without waiting out the poll interval.
    pub async fn drain(&self) {
        for id in self.store.pending_tasks().await {
            match self.store.settle(id).await {
                Ok(Some(result)) => {
                    metrics::counter!("inbox.settled").increment(1);
                    tracing::debug!(
                        order_id = %result.order_id,
                        success = result.success,
                        "Settlement committed"
                    );
                }
                Ok(None) => {} // Row already processed, nothing to do
                Err(StoreError::Codec(e)) => {
                    // A malformed payload can never settle; discard it so the
                    // loop does not wedge on the same row forever.
                    metrics::counter!("inbox.discarded").increment(1);
                    tracing::warn!(message_id = %id, error = %e, "Discarding undecodable task row");
                    self.store.discard_task(id).await;
                }
                Err(e) => {
                    tracing::error!(message_id = %id, error = %e, "Settlement failed, will retry");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code
mod tests {
    use super::*;
    use orderwire_core::event::{DomainEvent, EventKind, EventRecord, PaymentTask};
    use orderwire_core::money::Money;
    use orderwire_core::order::OrderId;
    use orderwire_core::account::UserId;
    use orderwire_core::store::OutboxSource;
    use orderwire_store::InboxReceipt;

    async fn record_task(store: &PaymentStore, user: UserId, amount: i64) -> PaymentTask {
        let task = PaymentTask {
            order_id: OrderId::new(),
            user_id: user,
            amount: Money::from_cents(amount),
        };
        let record = DomainEvent::PaymentTask(task.clone()).encode().unwrap();
        match store.record_task(&task, record).await {
            InboxReceipt::Recorded(_) => task,
            InboxReceipt::Duplicate => panic!("task should not be a duplicate"),
        }
    }

    #[tokio::test]
    async fn drain_settles_every_pending_task() {
        let store = Arc::new(PaymentStore::new());
        let user = UserId::new();
        store.open_account(user).await.unwrap();
        store.top_up(user, Money::from_cents(1000)).await.unwrap();

        record_task(&store, user, 400).await;
        record_task(&store, UserId::new(), 100).await; // no account

        let (processor, _shutdown) = SettlementProcessor::new(Arc::clone(&store), Duration::from_millis(10));
        processor.drain().await;

        assert!(store.pending_tasks().await.is_empty());
        assert_eq!(store.account(user).await.unwrap().balance, Money::from_cents(600));

        let outbox = store.unpublished().await.unwrap();
        assert_eq!(outbox.len(), 2);
        assert!(outbox.iter().all(|m| m.record.kind == EventKind::PaymentResult));
    }

    #[tokio::test]
    async fn undecodable_rows_are_discarded_not_retried() {
        let store = Arc::new(PaymentStore::new());

        // Sneak a malformed payload in under a valid correlation key.
        let task = PaymentTask {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            amount: Money::from_cents(1),
        };
        let bad = EventRecord::new(EventKind::PaymentTask, b"not json".to_vec());
        store.record_task(&task, bad).await;

        let (processor, _shutdown) = SettlementProcessor::new(Arc::clone(&store), Duration::from_millis(10));
        processor.drain().await;

        assert!(store.pending_tasks().await.is_empty());
        assert!(store.unpublished().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let store = Arc::new(PaymentStore::new());
        let (processor, shutdown) = SettlementProcessor::new(store, Duration::from_millis(5));

        let handle = tokio::spawn(processor.run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("processor should stop promptly")
            .expect("task should join");
    }
}
