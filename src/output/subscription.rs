//! # Per-subscriber delivery endpoint.
//!
//! A subscription is the receiving half of a pair of channels owned by the
//! [`OutputMultiplexer`](crate::output::OutputMultiplexer):
//!
//! - **record channel** - ordered [`OutputRecord`]s; closes at end-of-stream
//! - **error channel** - at most one fatal [`StreamError`]; closes with the
//!   record channel
//!
//! ## Rules
//! - The concatenation of received record contents is always a prefix of
//!   the multiplexer's log, and equals the full log for a subscription
//!   held until the record channel closes.
//! - Dropping a subscription unsubscribes: the multiplexer prunes the dead
//!   channels on its next delivery attempt.

use std::time::SystemTime;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::StreamError;

/// One unit of delivery to an output subscriber.
///
/// `content` is either the entire accumulated backlog at subscription time
/// (a single record) or one live chunk. Records are never split or
/// coalesced after emission.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    /// Opaque bytes, in the order they were read from their source.
    pub content: Bytes,
    /// When the record was handed to this subscription.
    pub received_at: SystemTime,
}

/// A live output subscription.
///
/// Obtained from
/// [`Supervisor::subscribe_output`](crate::Supervisor::subscribe_output) or
/// [`OutputMultiplexer::subscribe`](crate::output::OutputMultiplexer::subscribe).
#[derive(Debug)]
pub struct OutputSubscription {
    records: mpsc::Receiver<OutputRecord>,
    errors: mpsc::Receiver<StreamError>,
}

impl OutputSubscription {
    pub(crate) fn new(
        records: mpsc::Receiver<OutputRecord>,
        errors: mpsc::Receiver<StreamError>,
    ) -> Self {
        Self { records, errors }
    }

    /// Receives the next output record.
    ///
    /// Returns `None` once every reader has reached EOF and the full
    /// history has been delivered.
    pub async fn recv(&mut self) -> Option<OutputRecord> {
        self.records.recv().await
    }

    /// Receives the fatal read error, if one occurred.
    ///
    /// At most one error is ever delivered. Returns `None` once the
    /// multiplexer has terminated without (further) errors.
    pub async fn recv_error(&mut self) -> Option<StreamError> {
        self.errors.recv().await
    }

    /// Splits the subscription into its raw channel halves.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<OutputRecord>,
        mpsc::Receiver<StreamError>,
    ) {
        (self.records, self.errors)
    }
}
