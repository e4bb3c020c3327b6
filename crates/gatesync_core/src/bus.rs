//! Event bus for notifying UI consumers of cache and sync changes.
//!
//! The bus is a pure relay: fire-and-forget fan-out to every currently
//! attached consumer, with no acknowledgment and no history. A consumer
//! that is not subscribed at publish time simply misses the event; do not
//! add buffering here without revisiting the best-effort contract every
//! publisher relies on.

use crate::types::{ActionId, CacheKey};
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A notification delivered to UI consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A cached read result was refreshed from the network.
    CacheRefreshed {
        /// The key whose snapshot changed.
        key: CacheKey,
    },
    /// A drain pass replayed every pending action successfully.
    SyncConfirmed,
    /// A drain pass stopped at a failing action.
    DrainHalted {
        /// The first action that failed; it and everything after it remain
        /// queued.
        action_id: ActionId,
        /// The executor's failure description.
        reason: String,
    },
}

/// Fan-out of [`SyncEvent`]s to all attached consumers.
///
/// Thread-safe; publishers and subscribers may live on any thread.
/// Dropping a receiver unsubscribes it - disconnected consumers are pruned
/// on the next publish.
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<SyncEvent>>>,
}

impl EventBus {
    /// Creates a new bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to all future events.
    ///
    /// Returns a receiver that sees every event published after this call,
    /// in publish order.
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Delivery is best-effort; disconnected subscribers are removed.
    pub fn publish(&self, event: SyncEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn publish_and_receive() {
        let bus = EventBus::new();
        let rx = bus.subscribe();

        let event = SyncEvent::CacheRefreshed {
            key: CacheKey::list("guests", "1"),
        };
        bus.publish(event.clone());

        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, event);
    }

    #[test]
    fn multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.publish(SyncEvent::SyncConfirmed);

        assert_eq!(rx1.recv().unwrap(), SyncEvent::SyncConfirmed);
        assert_eq!(rx2.recv().unwrap(), SyncEvent::SyncConfirmed);
    }

    #[test]
    fn events_arrive_in_publish_order() {
        let bus = EventBus::new();
        let rx = bus.subscribe();

        bus.publish(SyncEvent::SyncConfirmed);
        bus.publish(SyncEvent::DrainHalted {
            action_id: ActionId::new(4),
            reason: "offline".into(),
        });

        assert_eq!(rx.recv().unwrap(), SyncEvent::SyncConfirmed);
        assert!(matches!(
            rx.recv().unwrap(),
            SyncEvent::DrainHalted { action_id, .. } if action_id == ActionId::new(4)
        ));
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(SyncEvent::SyncConfirmed);

        let rx = bus.subscribe();
        assert!(rx.try_recv().is_err());

        bus.publish(SyncEvent::SyncConfirmed);
        assert_eq!(rx.recv().unwrap(), SyncEvent::SyncConfirmed);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(rx);
        bus.publish(SyncEvent::SyncConfirmed);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn threaded_publish() {
        let bus = Arc::new(EventBus::new());
        let rx = bus.subscribe();

        let bus_clone = Arc::clone(&bus);
        let handle = thread::spawn(move || {
            bus_clone.publish(SyncEvent::SyncConfirmed);
        });

        let received = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(received, SyncEvent::SyncConfirmed);

        handle.join().unwrap();
    }
}
