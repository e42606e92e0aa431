//! State publication
//!
//! The controller calls [`StatePublisher::publish`] at every state
//! transition. Delivery to observers is the publisher's business; the
//! default [`CoverEventBus`] fans events out over a broadcast channel.
//!
//! A bus with no subscribers drops events silently, and a subscriber that
//! falls more than `capacity` events behind receives a `Lagged` error and
//! skips ahead.

use crate::CoverState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Default event buffer size
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// =============================================================================
// Publishers
// =============================================================================

/// Receives every state transition of a controller
pub trait StatePublisher: Send + Sync {
    fn publish(&self, state: &CoverState);
}

/// Publisher that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl StatePublisher for NullPublisher {
    fn publish(&self, _state: &CoverState) {}
}

// =============================================================================
// Event bus
// =============================================================================

/// A published state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverEvent {
    /// Monotonically increasing per bus, starting at 1
    pub sequence: u64,
    /// Unix time in milliseconds
    pub timestamp_ms: i64,
    pub state: CoverState,
}

/// Bus statistics for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    /// Events published while nobody was subscribed
    pub events_unobserved: u64,
    pub subscriber_count: usize,
}

/// Broadcast bus for cover state events
pub struct CoverEventBus {
    sender: broadcast::Sender<CoverEvent>,
    sequence: AtomicU64,
    events_unobserved: AtomicU64,
}

impl CoverEventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
            events_unobserved: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoverEvent> {
        self.sender.subscribe()
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            events_published: self.sequence.load(Ordering::Relaxed),
            events_unobserved: self.events_unobserved.load(Ordering::Relaxed),
            subscriber_count: self.sender.receiver_count(),
        }
    }
}

impl Default for CoverEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl StatePublisher for CoverEventBus {
    fn publish(&self, state: &CoverState) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let event = CoverEvent {
            sequence,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            state: state.clone(),
        };

        if self.sender.send(event).is_err() {
            self.events_unobserved.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for CoverEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverEventBus").field("stats", &self.stats()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = CoverEventBus::default();
        bus.publish(&CoverState::default());

        let stats = bus.stats();
        assert_eq!(stats.events_published, 1);
        assert_eq!(stats.events_unobserved, 1);
        assert_eq!(stats.subscriber_count, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_sequenced_events() {
        let bus = CoverEventBus::new(8);
        let mut rx = bus.subscribe();

        let mut opening = CoverState::default();
        opening.is_opening = true;
        bus.publish(&opening);
        bus.publish(&CoverState::default());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert!(first.state.is_opening);
        assert_eq!(second.sequence, 2);
        assert!(!second.state.is_opening);
        assert_eq!(bus.stats().events_unobserved, 0);
    }
}
