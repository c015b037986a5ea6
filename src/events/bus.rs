//! # Event bus for dispatch diagnostics.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets fiber
//! workers publish failure reports without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Receivers (any):
//!   fiber 1 ──┐
//!   fiber 2 ──┼──────► Bus ───────► FiberPool::subscribe() ──► user code
//!   deferred ─┘  (broadcast chan)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for dispatch events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::FiberSpawned));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::CallbackFailed).with_signal("late"));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::CallbackFailed);
        assert_eq!(ev.signal.as_deref(), Some("late"));
    }
}
