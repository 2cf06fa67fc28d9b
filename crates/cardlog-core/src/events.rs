//! Review events and the broadcast bus that delivers them.
//!
//! The host fires one event per completed card review. Host bindings emit a
//! [`ReviewEvent`] on the [`EventBus`]; the history worker subscribes and
//! records each one in delivery order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::CardId;

/// A card review was completed in the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEvent {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    pub card_id: CardId,
    pub occurred_at: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(card_id: impl Into<CardId>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            card_id: card_id.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Broadcast-based event bus for review events.
///
/// Uses `tokio::sync::broadcast`. Slow receivers that fall behind receive a
/// `Lagged` error and miss events; the history worker logs and continues.
pub struct EventBus {
    tx: broadcast::Sender<ReviewEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: ReviewEvent) {
        tracing::debug!(
            event_id = %event.event_id,
            card_id = %event.card_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Emit a review event for `card_id`.
    pub fn card_reviewed(&self, card_id: impl Into<CardId>) -> ReviewEvent {
        let event = ReviewEvent::new(card_id);
        self.emit(event.clone());
        event
    }

    /// Subscribe to receive events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
