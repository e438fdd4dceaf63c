//! Append-only ledger of produced and received events.

use orderwire_core::event::{CorrelationKey, EventKind, EventRecord};
use orderwire_core::message::{InboxMessage, MessageId, OutboxMessage};
use std::collections::HashMap;

/// Outcome of recording a received event into the inbox.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InboxReceipt {
    /// First time this logical event was seen; a row was appended.
    Recorded(MessageId),
    /// A row with the same correlation key already exists. The delivery is a
    /// duplicate and must be discarded without any business effect.
    Duplicate,
}

/// Append-only outbox/inbox tables with an indexed correlation-key dedup map.
///
/// The journal is plain data guarded by its owning store's lock; its methods
/// are synchronous and must be called while that lock is held, which is what
/// makes the check-then-append on the inbox index atomic.
#[derive(Debug, Default)]
pub struct Journal {
    outbox: Vec<OutboxMessage>,
    inbox: Vec<InboxMessage>,
    inbox_index: HashMap<CorrelationKey, MessageId>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unprocessed outbox row for an event record.
    pub fn append_outbox(&mut self, record: EventRecord) -> MessageId {
        let message = OutboxMessage::new(record);
        let id = message.id;
        tracing::debug!(message_id = %id, kind = %message.record.kind, "Outbox row appended");
        self.outbox.push(message);
        id
    }

    /// Returns a copy of every outbox row not yet confirmed as published.
    #[must_use]
    pub fn unpublished(&self) -> Vec<OutboxMessage> {
        self.outbox.iter().filter(|m| !m.processed).cloned().collect()
    }

    /// Marks outbox rows as published.
    ///
    /// Monotonic: rows already marked stay marked, unknown ids are ignored.
    pub fn mark_published(&mut self, ids: &[MessageId]) {
        for message in &mut self.outbox {
            if !message.processed && ids.contains(&message.id) {
                message.processed = true;
            }
        }
    }

    /// Records a received event, deduplicating on its correlation key.
    ///
    /// Any existing row with the same key counts as a duplicate, processed or
    /// not: a redelivery racing the processor must not enqueue a second copy
    /// of an event that is already durably recorded.
    pub fn record_inbox(&mut self, correlation: CorrelationKey, record: EventRecord) -> InboxReceipt {
        if self.inbox_index.contains_key(&correlation) {
            return InboxReceipt::Duplicate;
        }

        let message = InboxMessage::new(correlation, record);
        let id = message.id;
        self.inbox_index.insert(correlation, id);
        self.inbox.push(message);
        tracing::debug!(message_id = %id, correlation = %correlation, "Inbox row recorded");
        InboxReceipt::Recorded(id)
    }

    /// Returns the ids of unprocessed inbox rows of the given kind, oldest
    /// first.
    #[must_use]
    pub fn pending_inbox(&self, kind: EventKind) -> Vec<MessageId> {
        self.inbox
            .iter()
            .filter(|m| !m.processed && m.record.kind == kind)
            .map(|m| m.id)
            .collect()
    }

    /// Looks up an inbox row by id.
    #[must_use]
    pub fn inbox_message(&self, id: MessageId) -> Option<&InboxMessage> {
        self.inbox.iter().find(|m| m.id == id)
    }

    /// Marks an inbox row as processed.
    ///
    /// Monotonic; returns whether the flag actually transitioned.
    pub fn mark_inbox_processed(&mut self, id: MessageId) -> bool {
        match self.inbox.iter_mut().find(|m| m.id == id && !m.processed) {
            Some(message) => {
                message.processed = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code
mod tests {
    use super::*;
    use orderwire_core::event::{DomainEvent, PaymentResult, PaymentTask};
    use orderwire_core::money::Money;
    use orderwire_core::order::OrderId;
    use orderwire_core::account::UserId;

    fn task_event() -> DomainEvent {
        DomainEvent::PaymentTask(PaymentTask {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            amount: Money::from_cents(400),
        })
    }

    #[test]
    fn appended_outbox_rows_are_unpublished() {
        let mut journal = Journal::new();
        let id = journal.append_outbox(task_event().encode().unwrap());

        let pending = journal.unpublished();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert!(!pending[0].processed);
    }

    #[test]
    fn mark_published_removes_rows_from_unpublished() {
        let mut journal = Journal::new();
        let first = journal.append_outbox(task_event().encode().unwrap());
        let second = journal.append_outbox(task_event().encode().unwrap());

        journal.mark_published(&[first]);

        let pending = journal.unpublished();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);
    }

    #[test]
    fn mark_published_ignores_unknown_ids() {
        let mut journal = Journal::new();
        journal.append_outbox(task_event().encode().unwrap());
        journal.mark_published(&[MessageId::new()]);
        assert_eq!(journal.unpublished().len(), 1);
    }

    #[test]
    fn record_inbox_deduplicates_on_correlation_key() {
        let mut journal = Journal::new();
        let event = task_event();
        let record = event.encode().unwrap();

        let first = journal.record_inbox(event.correlation_key(), record.clone());
        assert!(matches!(first, InboxReceipt::Recorded(_)));

        let second = journal.record_inbox(event.correlation_key(), record);
        assert_eq!(second, InboxReceipt::Duplicate);
        assert_eq!(journal.pending_inbox(EventKind::PaymentTask).len(), 1);
    }

    #[test]
    fn unprocessed_rows_stay_duplicates() {
        // A redelivery must be absorbed even before the processor has run.
        let mut journal = Journal::new();
        let event = task_event();
        journal.record_inbox(event.correlation_key(), event.encode().unwrap());

        let receipt = journal.record_inbox(event.correlation_key(), event.encode().unwrap());
        assert_eq!(receipt, InboxReceipt::Duplicate);
    }

    #[test]
    fn processed_rows_remain_duplicates() {
        let mut journal = Journal::new();
        let event = task_event();
        let InboxReceipt::Recorded(id) =
            journal.record_inbox(event.correlation_key(), event.encode().unwrap())
        else {
            panic!("first receipt must record");
        };
        journal.mark_inbox_processed(id);

        let receipt = journal.record_inbox(event.correlation_key(), event.encode().unwrap());
        assert_eq!(receipt, InboxReceipt::Duplicate);
    }

    #[test]
    fn pending_inbox_filters_by_kind() {
        let mut journal = Journal::new();
        let task = task_event();
        let result = DomainEvent::PaymentResult(PaymentResult::succeeded(OrderId::new()));
        journal.record_inbox(task.correlation_key(), task.encode().unwrap());
        journal.record_inbox(result.correlation_key(), result.encode().unwrap());

        assert_eq!(journal.pending_inbox(EventKind::PaymentTask).len(), 1);
        assert_eq!(journal.pending_inbox(EventKind::PaymentResult).len(), 1);
    }

    #[test]
    fn mark_inbox_processed_is_monotonic() {
        let mut journal = Journal::new();
        let event = task_event();
        let InboxReceipt::Recorded(id) =
            journal.record_inbox(event.correlation_key(), event.encode().unwrap())
        else {
            panic!("first receipt must record");
        };

        assert!(journal.mark_inbox_processed(id));
        assert!(!journal.mark_inbox_processed(id));
        assert!(!journal.mark_inbox_processed(MessageId::new()));
    }
}
