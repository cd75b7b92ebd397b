//! # Non-blocking event fan-out to registered subscribers.
//!
//! [`SubscriberSet`] distributes runtime events to every [`Subscribe`]r
//! without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit_arc(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)        └──► panic caught → SubscriberPanicked
//! ```
//!
//! ## Rules
//! - `emit_arc` uses `try_send`: a full or closed queue drops the event
//!   for that subscriber only and publishes `SubscriberOverflow`.
//! - There is no cross-subscriber ordering; each queue is FIFO on its own.
//! - Overflow/panic diagnostics never generate further diagnostics about
//!   themselves (storm guard).
//! - Workers exit once the set is dropped (their queues close).

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Per-subscriber queue metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for the registered event subscribers.
pub(crate) struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker task per subscriber.
    ///
    /// Must be called within a Tokio runtime.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let bus_for_worker = bus.clone();

            tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = describe_panic(&*panic_err);
                        bus_for_worker.publish(Event::subscriber_panicked(sub.name(), info));
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self { channels, bus }
    }

    /// Emits a pre-allocated event to all subscribers, non-blocking.
    pub(crate) fn emit_arc(&self, event: Arc<Event>) {
        let storm_guard = event.is_fanout_diagnostic();

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !storm_guard {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !storm_guard {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }
}

fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
