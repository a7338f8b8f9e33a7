//! Real-time change-event fanout
//!
//! Broadcasts entity mutations to every connected observer. Delivery is
//! best-effort and at-most-once: there is no persistence and no replay, a
//! subscriber connecting after a publish never sees it, and a subscriber
//! that falls too far behind loses the events it lagged past rather than
//! blocking the publisher.
//!
//! Per subscriber, successive events arrive in publish order (FIFO); no
//! ordering is guaranteed across subscribers.
//!
//! [`ChangeSink`] keeps the fanout pluggable: a persisted-log sink with
//! stronger delivery guarantees could substitute without touching the
//! record layer that publishes into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default capacity of the broadcast buffer; a subscriber more than this
/// many events behind starts losing the oldest ones
pub const DEFAULT_CAPACITY: usize = 1000;

/// Entity kind a change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Disaster,
    Report,
    Resource,
}

/// The mutation that produced the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// A transient notification of an entity mutation. For create and update
/// the payload is the full resulting entity; for delete it carries the id
/// and the final audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub entity_kind: EntityKind,
    pub operation: Operation,
    pub payload: Value,
}

/// Outbound sink for change events, non-blocking from the publisher's
/// perspective
pub trait ChangeSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Broadcast-channel fanout to all currently connected subscribers
pub struct ChangeFanout {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFanout {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register an observer; it receives every event published after this
    /// call until the handle is dropped
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Currently connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFanout {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeSink for ChangeFanout {
    fn publish(&self, event: ChangeEvent) {
        // No receivers is not a failure; events are fire-and-forget.
        match self.tx.send(event) {
            Ok(delivered) => debug!(subscribers = delivered, "change event published"),
            Err(_) => debug!("change event published with no subscribers"),
        }
    }
}

/// Receiving half of a subscription. Dropping it unsubscribes; dropping an
/// already-disconnected handle is a no-op, so unsubscription is idempotent.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Next event in publish order, or `None` once the fanout is gone.
    /// Lagging past the buffer skips the lost events and keeps going.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed = missed, "slow subscriber dropped events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant; `None` when no event is ready
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed = missed, "slow subscriber dropped events");
                }
                Err(_) => return None,
            }
        }
    }
}
