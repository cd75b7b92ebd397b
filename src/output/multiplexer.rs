//! # Output multiplexer: single-producer-per-reader, multi-consumer fan-out.
//!
//! [`OutputMultiplexer`] drains one or more byte-stream readers (in
//! practice the stdout and stderr pipes of one child process), keeps every
//! byte in an append-only in-memory log, and broadcasts each chunk to any
//! number of concurrently attached subscriptions. Subscribers may join at
//! any moment (before the child emits anything, mid-stream, or after EOF)
//! and every one of them observes the complete history.
//!
//! ## Architecture
//! ```text
//! reader A ──► producer A ──┐
//!                           ├──► mailbox (mpsc) ──► broadcaster
//! reader B ──► producer B ──┘                          │
//!                                          ┌───────────┤ one mutex
//!                                          ▼           ▼
//!                                    append to log   deliver to every
//!                                                    live subscription
//!
//! subscribe() ──► same mutex ──► snapshot log + join live set (atomic)
//! ```
//!
//! ## Rules
//! - **Intra-reader order** is preserved on every subscription; there is no
//!   ordering across readers and no merging by timestamp.
//! - **Snapshot+join is atomic**: no chunk can be appended between a new
//!   subscriber's backlog snapshot and its admission to the live set. The
//!   broadcaster appends and delivers under the same mutex `subscribe`
//!   takes, so a late joiner either sees a chunk in its backlog or receives
//!   it live, never neither.
//! - **Synchronous fan-out**: the broadcaster does not take the next chunk
//!   until every live subscription has accepted the current one (each has a
//!   one-record buffer). A slow subscriber therefore stalls the others; a
//!   *dropped* subscription is pruned on the next delivery attempt.
//! - **EOF only ends a reader**; any other read error is fatal for that
//!   reader alone and is surfaced on subscribers' error channels, at most
//!   once per subscriber. The remaining readers keep draining.
//! - **Termination**: when the last producer exits, every subscription's
//!   record channel is closed and [`drained`](OutputMultiplexer::drained)
//!   resolves. Subscribers joining after that point still get the full
//!   backlog as one record, followed by an immediate close.

use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::StreamError;
use crate::events::{Bus, Event, EventKind};
use crate::output::subscription::{OutputRecord, OutputSubscription};
use crate::process::ProcessId;

/// Boxed byte-stream reader consumed by one producer task.
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// Producers rendezvous with the broadcaster one message at a time.
const MAILBOX_CAPACITY: usize = 1;

/// What a producer hands to the broadcaster.
enum ProducerMessage {
    /// One chunk read from a reader, at most `chunk_size` bytes.
    Chunk(Bytes),
    /// The producer's reader failed; the producer has exited.
    Failed(StreamError),
}

/// Delivery endpoint of one live subscriber, as seen from the broadcaster.
#[derive(Debug)]
struct SubscriberSlot {
    records: mpsc::Sender<OutputRecord>,
    errors: mpsc::Sender<StreamError>,
    /// Set once an error has been handed to this subscriber.
    errored: bool,
}

impl SubscriberSlot {
    /// Delivers `err` unless this subscriber already received one.
    fn deliver_error(&mut self, err: &StreamError) {
        if self.errored {
            return;
        }
        // Capacity-1 channel; if a racing error already fills it the drop
        // keeps the at-most-one contract.
        let _ = self.errors.try_send(err.clone());
        self.errored = true;
    }
}

/// Mutable multiplexer state. One mutex covers the whole struct: log
/// appends, fan-out, subscriber admission, and the done flag must be
/// mutually exclusive for the snapshot+join invariant to hold.
#[derive(Default, Debug)]
struct MuxState {
    /// Append-only combined log of every byte read from every reader.
    log: Vec<u8>,
    /// Currently attached subscriptions.
    subscribers: Vec<SubscriberSlot>,
    /// First fatal read error, replayed to late joiners.
    first_error: Option<StreamError>,
    /// True once every producer has exited.
    done: bool,
}

/// Fan-out of a process's combined output to late-joining subscribers.
///
/// Construction immediately starts draining the readers in the background;
/// no subscriber is required for the log to fill up.
#[derive(Debug)]
pub struct OutputMultiplexer {
    shared: Arc<Mutex<MuxState>>,
    drained: CancellationToken,
}

impl OutputMultiplexer {
    /// Creates a multiplexer over the given readers with the default chunk
    /// size and begins draining them immediately.
    ///
    /// Fails with [`StreamError::NoReaders`] when `readers` is empty.
    /// Must be called within a Tokio runtime.
    pub fn new(readers: Vec<OutputReader>) -> Result<Self, StreamError> {
        Self::spawn(readers, DEFAULT_CHUNK_SIZE, Bus::new(1), None)
    }

    /// Multiplexer wired into the supervisor runtime: configured chunk
    /// size, shared event bus, and the owning process id on every event.
    pub(crate) fn for_process(
        readers: Vec<OutputReader>,
        chunk_size: usize,
        bus: Bus,
        process: &ProcessId,
    ) -> Result<Self, StreamError> {
        Self::spawn(readers, chunk_size, bus, Some(process.to_string()))
    }

    fn spawn(
        readers: Vec<OutputReader>,
        chunk_size: usize,
        bus: Bus,
        process: Option<String>,
    ) -> Result<Self, StreamError> {
        if readers.is_empty() {
            return Err(StreamError::NoReaders);
        }

        let shared = Arc::new(Mutex::new(MuxState::default()));
        let drained = CancellationToken::new();
        let (mailbox_tx, mailbox_rx) = mpsc::channel(MAILBOX_CAPACITY);

        for reader in readers {
            tokio::spawn(drain_reader(reader, chunk_size.max(1), mailbox_tx.clone()));
        }
        // The broadcaster observes end-of-stream once every producer has
        // dropped its sender; the multiplexer must not keep one alive.
        drop(mailbox_tx);

        tokio::spawn(broadcast_loop(
            Arc::clone(&shared),
            mailbox_rx,
            drained.clone(),
            bus,
            process,
        ));

        Ok(Self { shared, drained })
    }

    /// Attaches a new subscriber and returns its delivery endpoint.
    ///
    /// The subscription starts with the entire current log as a single
    /// record (if any bytes have been read), then receives live chunks
    /// until end-of-stream. Subscribing after end-of-stream yields the
    /// backlog record followed by an immediate close.
    ///
    /// ### Atomicity
    /// Snapshotting the log and joining the broadcast group happen under
    /// the multiplexer's mutex, mutually exclusive with log appends and
    /// chunk delivery. There is no window in which a chunk could land
    /// after the snapshot but before admission.
    pub async fn subscribe(&self) -> OutputSubscription {
        let (record_tx, record_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);

        let mut state = self.shared.lock().await;
        if !state.log.is_empty() {
            let backlog = OutputRecord {
                content: Bytes::copy_from_slice(&state.log),
                received_at: SystemTime::now(),
            };
            // Fresh capacity-1 channel: the backlog always fits.
            let _ = record_tx.try_send(backlog);
        }

        let mut slot = SubscriberSlot {
            records: record_tx,
            errors: error_tx,
            errored: false,
        };
        if let Some(err) = &state.first_error {
            slot.deliver_error(err);
        }
        if !state.done {
            state.subscribers.push(slot);
        }
        // Past end-of-stream the slot is dropped here instead, closing both
        // channels as soon as the buffered backlog/error are consumed.

        OutputSubscription::new(record_rx, error_rx)
    }

    /// Resolves once every reader has reached EOF and all subscriptions
    /// have been closed.
    pub async fn drained(&self) {
        self.drained.cancelled().await;
    }

    /// True once every reader has reached EOF.
    pub fn is_drained(&self) -> bool {
        self.drained.is_cancelled()
    }
}

/// Reads `reader` to completion in fixed-size chunks.
///
/// EOF ends the producer silently; any other error is forwarded and ends
/// the producer. The mailbox send blocks until the broadcaster has taken
/// the previous message, so a producer never outruns delivery.
async fn drain_reader(
    mut reader: OutputReader,
    chunk_size: usize,
    mailbox: mpsc::Sender<ProducerMessage>,
) {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if mailbox.send(ProducerMessage::Chunk(chunk)).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = mailbox
                    .send(ProducerMessage::Failed(StreamError::read_failed(&err)))
                    .await;
                break;
            }
        }
    }
}

/// Consumes the mailbox until every producer has exited, then closes every
/// live subscription and signals completion.
async fn broadcast_loop(
    shared: Arc<Mutex<MuxState>>,
    mut mailbox: mpsc::Receiver<ProducerMessage>,
    drained: CancellationToken,
    bus: Bus,
    process: Option<String>,
) {
    while let Some(msg) = mailbox.recv().await {
        match msg {
            ProducerMessage::Chunk(chunk) => {
                let mut state = shared.lock().await;
                // Log first, fan out second: the backlog snapshot is a
                // strict prefix of the log at every instant.
                state.log.extend_from_slice(&chunk);
                deliver_chunk(&mut state.subscribers, &chunk).await;
            }
            ProducerMessage::Failed(err) => {
                let mut state = shared.lock().await;
                if state.first_error.is_none() {
                    state.first_error = Some(err.clone());
                }
                for slot in &mut state.subscribers {
                    slot.deliver_error(&err);
                }
                drop(state);
                bus.publish(
                    tagged(Event::now(EventKind::ReadFailed), &process)
                        .with_error(err.to_string()),
                );
            }
        }
    }

    let mut state = shared.lock().await;
    state.done = true;
    // Dropping the senders closes every subscription's channels; pending
    // buffered records are still delivered before the receivers see None.
    state.subscribers.clear();
    drop(state);

    drained.cancel();
    bus.publish(tagged(Event::now(EventKind::OutputDrained), &process));
}

/// Synchronous fan-out of one chunk; prunes subscribers whose receiving
/// half is gone.
async fn deliver_chunk(subscribers: &mut Vec<SubscriberSlot>, chunk: &Bytes) {
    let mut idx = 0;
    while idx < subscribers.len() {
        let record = OutputRecord {
            content: chunk.clone(),
            received_at: SystemTime::now(),
        };
        if subscribers[idx].records.send(record).await.is_ok() {
            idx += 1;
        } else {
            subscribers.swap_remove(idx);
        }
    }
}

fn tagged(ev: Event, process: &Option<String>) -> Event {
    match process {
        Some(id) => ev.with_process(id.clone()),
        None => ev,
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    const STDOUT_LINES: &[u8] = b"some output line 1\nsome output line 2\nsome output line 3";
    const STDERR_LINE: &[u8] = b"some error";

    fn reader(bytes: &'static [u8]) -> OutputReader {
        Box::new(bytes)
    }

    /// Fails every read with the same message.
    struct ErrorReader;

    impl AsyncRead for ErrorReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("errorReader returns errors")))
        }
    }

    async fn collect(sub: &mut OutputSubscription) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(record) = sub.recv().await {
            bytes.extend_from_slice(&record.content);
        }
        bytes
    }

    #[tokio::test]
    async fn empty_reader_closes_without_records() {
        let mux = OutputMultiplexer::new(vec![reader(b"")]).unwrap();
        let mut sub = mux.subscribe().await;
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn rejects_zero_readers() {
        let err = OutputMultiplexer::new(Vec::new()).unwrap_err();
        assert_eq!(err, StreamError::NoReaders);
    }

    #[tokio::test]
    async fn two_readers_deliver_both_streams_in_full() {
        let mux =
            OutputMultiplexer::new(vec![reader(STDOUT_LINES), reader(STDERR_LINE)]).unwrap();
        let mut sub = mux.subscribe().await;
        let bytes = collect(&mut sub).await;

        // Each stream arrives contiguously (both fit in one chunk); the
        // order across streams is unspecified.
        let forward = [STDOUT_LINES, STDERR_LINE].concat();
        let backward = [STDERR_LINE, STDOUT_LINES].concat();
        assert!(bytes == forward || bytes == backward);
    }

    #[tokio::test]
    async fn late_subscriber_gets_backlog_as_single_record() {
        let mux =
            OutputMultiplexer::new(vec![reader(STDOUT_LINES), reader(STDERR_LINE)]).unwrap();
        mux.drained().await;
        assert!(mux.is_drained());

        let mut sub = mux.subscribe().await;
        let first = sub.recv().await.expect("backlog record");
        assert_eq!(first.content.len(), STDOUT_LINES.len() + STDERR_LINE.len());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn early_and_late_subscribers_see_identical_bytes() {
        let mux =
            OutputMultiplexer::new(vec![reader(STDOUT_LINES), reader(STDERR_LINE)]).unwrap();

        let mut early = mux.subscribe().await;
        let early_bytes = tokio::spawn(async move { collect(&mut early).await });

        mux.drained().await;
        let mut late = mux.subscribe().await;
        let late_bytes = collect(&mut late).await;

        assert_eq!(early_bytes.await.unwrap(), late_bytes);
    }

    #[tokio::test]
    async fn read_error_reaches_a_subscriber_exactly_once() {
        let mux =
            OutputMultiplexer::new(vec![reader(STDOUT_LINES), Box::new(ErrorReader)]).unwrap();
        let mut sub = mux.subscribe().await;

        // The record channel still closes cleanly after the healthy reader
        // finishes, error or not.
        let bytes = collect(&mut sub).await;
        assert_eq!(bytes, STDOUT_LINES);

        let err = sub.recv_error().await.expect("fatal read error");
        assert_eq!(
            err.to_string(),
            "failed to read output: errorReader returns errors"
        );
        assert!(sub.recv_error().await.is_none());
    }

    #[tokio::test]
    async fn intra_reader_order_survives_chunking() {
        let alphabet: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        let mux = OutputMultiplexer::for_process(
            vec![reader(alphabet)],
            4,
            Bus::new(1),
            &ProcessId::generate(),
        )
        .unwrap();

        let mut sub = mux.subscribe().await;
        assert_eq!(collect(&mut sub).await, alphabet);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_stall_the_rest() {
        let alphabet: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        let mux = OutputMultiplexer::for_process(
            vec![reader(alphabet)],
            1,
            Bus::new(1),
            &ProcessId::generate(),
        )
        .unwrap();

        let abandoned = mux.subscribe().await;
        drop(abandoned);

        let mut sub = mux.subscribe().await;
        assert_eq!(collect(&mut sub).await, alphabet);
        mux.drained().await;
    }
}
