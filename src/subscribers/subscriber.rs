//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers
//! (logging, metrics, audit) into the supervisor runtime.
//!
//! Each subscriber gets a dedicated worker task and a bounded queue; a
//! slow or panicking subscriber affects only itself.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
///
/// ### Rules
/// - `on_event()` runs in a dedicated worker task, never in the
///   publisher's context; events arrive in per-subscriber FIFO order.
/// - Queue overflow drops the event for this subscriber only and is
///   reported as a `SubscriberOverflow` event.
/// - Panics are caught, reported as `SubscriberPanicked`, and do not crash
///   the runtime or other subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Handle errors internally; do not panic.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic diagnostics.
    ///
    /// Keep short and descriptive (e.g. "metrics", "audit").
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
