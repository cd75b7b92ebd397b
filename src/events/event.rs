//! # Runtime events emitted by the supervisor and the output multiplexer.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Process events**: spawn and kill of supervised children
//! - **Output events**: subscription admission, end-of-stream, read errors
//! - **Subscriber events**: diagnostics of the event fan-out itself
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! the process identifier, the OS pid, and error messages.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. This guarantees that events can be ordered correctly even
//! when delivered out-of-order through async channels.
//!
//! ## Event flow examples
//!
//! ### Process lifetime
//! ```text
//! Supervisor::start_process()
//!   → ProcessSpawned{process, pid}
//!   → ... child writes to its pipes ...
//!   → OutputDrained{process}        (both pipes hit EOF)
//!
//! Supervisor::stop_process()
//!   → ProcessStopped{process, pid}
//! ```
//!
//! ### Output streaming
//! ```text
//! Supervisor::subscribe_output() → OutputSubscribed{process}
//! producer read error            → ReadFailed{process, error}
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    SubscriberPanicked,
    /// Subscriber dropped an event (queue full or worker closed).
    SubscriberOverflow,

    // === Shutdown events ===
    /// Supervisor-wide shutdown requested; every started child is killed.
    ShutdownRequested,

    // === Process events ===
    /// A child process was spawned and registered.
    ProcessSpawned,
    /// SIGKILL was delivered to a child (or it was already gone).
    ProcessStopped,

    // === Output events ===
    /// A new output subscription was admitted.
    OutputSubscribed,
    /// Every output reader of a process reached EOF; the log is complete.
    OutputDrained,
    /// A producer hit a fatal read error on one of the output readers.
    ReadFailed,
}

/// Runtime event with optional metadata.
///
/// ## Fields
///
/// - `seq`: Unique sequence number for ordering (monotonically increasing)
/// - `at`: Wall-clock timestamp (may go backwards due to NTP, use for logging only)
/// - `kind`: Event classification
/// - `process`, `pid`, `error`: Optional metadata
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Registry identifier of the process, if applicable.
    pub process: Option<String>,
    /// OS pid of the child, if applicable.
    pub pid: Option<u32>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            process: None,
            pid: None,
            error: None,
        }
    }

    /// Attaches a process identifier.
    pub fn with_process(mut self, id: impl Into<String>) -> Self {
        self.process = Some(id.into());
        self
    }

    /// Attaches an OS pid.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Creates a subscriber overflow event.
    ///
    /// Emitted when a subscriber's queue is full and an event is dropped.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_error(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    ///
    /// Emitted when a subscriber panics during event processing.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_process(subscriber)
            .with_error(info)
    }

    /// True for events emitted by the fan-out machinery about itself.
    ///
    /// Used to stop overflow diagnostics from generating further overflow
    /// diagnostics in a storm.
    pub(crate) fn is_fanout_diagnostic(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
