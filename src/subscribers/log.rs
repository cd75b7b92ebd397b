//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [spawned] process=9f0c... pid=4242
//! [stopped] process=9f0c... pid=4242
//! [subscribed] process=9f0c...
//! [drained] process=9f0c...
//! [read-failed] process=9f0c... err="failed to read output: ..."
//! [shutdown-requested]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// implement a custom [`Subscribe`] for structured logging or metrics
/// collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ProcessSpawned => {
                println!(
                    "[spawned] process={:?} pid={:?}",
                    e.process, e.pid
                );
            }
            EventKind::ProcessStopped => {
                println!(
                    "[stopped] process={:?} pid={:?}",
                    e.process, e.pid
                );
            }
            EventKind::OutputSubscribed => {
                println!("[subscribed] process={:?}", e.process);
            }
            EventKind::OutputDrained => {
                println!("[drained] process={:?}", e.process);
            }
            EventKind::ReadFailed => {
                println!("[read-failed] process={:?} err={:?}", e.process, e.error);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] {:?}", e.error);
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] {:?} {:?}", e.process, e.error);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
