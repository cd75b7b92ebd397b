//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a wrapper around [`tokio::sync::broadcast`] that lets the
//! supervisor and the output multiplexers broadcast [`Event`]s to any
//! number of listeners.
//!
//! ## Key characteristics:
//! - **Broadcast semantics**: all active listeners receive a clone of each event
//! - **Non-persistent**: events are lost if there are no active listeners
//! - **Bounded capacity**: old events are dropped when the channel is full

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to >= 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active listeners.
    ///
    /// If there are no active listeners, the event is dropped silently.
    /// This is intentional as the supervisor can operate unobserved.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new listener that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
