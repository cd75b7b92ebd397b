//! # procvisor
//!
//! **Procvisor** is a Linux process supervision library.
//!
//! It starts arbitrary child processes, tracks their lifecycle, snapshots
//! their kernel state, and, at its core, multiplexes each child's combined
//! stdout/stderr to any number of concurrent subscribers. A subscriber may
//! join at any moment and always receives the complete output history from
//! byte zero, followed by a live tail until the process terminates.
//!
//! ## Features
//!
//! | Area           | Description                                              | Key types                                    |
//! |----------------|----------------------------------------------------------|----------------------------------------------|
//! | **Supervision**| Start, kill, and snapshot child processes.               | [`Supervisor`], [`ProcessRequest`]           |
//! | **Streaming**  | Full-history output fan-out to late-joining subscribers. | [`OutputSubscription`], [`OutputRecord`]     |
//! | **Status**     | Point-in-time kernel state from `/proc/<pid>/stat`.      | [`ProcessStatus`]                            |
//! | **Observability** | Hook into runtime events (logging, metrics, custom). | [`Subscribe`]                                |
//! | **Errors**     | Typed errors for the control plane and the streams.      | [`SupervisorError`], [`StreamError`]         |
//! | **Configuration** | Centralized runtime settings.                         | [`Config`]                                   |
//!
//! ## Optional features
//! - `events`: exports [`Event`] and [`EventKind`] for advanced integrations.
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//!
//! ```no_run
//! use procvisor::{Config, ProcessRequest, ResourceLimits, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = Supervisor::new(Config::default());
//!
//!     let id = supervisor
//!         .start_process(ProcessRequest {
//!             command: "bash".into(),
//!             args: vec![
//!                 "-c".into(),
//!                 "for i in {1..5}; do sleep 1; echo \"Hi, $i\"; done".into(),
//!             ],
//!             requested_by: "hashi".into(),
//!             resource_limits: ResourceLimits::default(),
//!         })
//!         .await?;
//!
//!     // Late joiners get the full history first, then the live tail.
//!     let mut output = supervisor.subscribe_output(&id).await?;
//!     while let Some(record) = output.recv().await {
//!         print!("{}", String::from_utf8_lossy(&record.content));
//!     }
//!
//!     println!("state: {}", supervisor.get_status(&id).await?.state);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Bytes from one stream are delivered in read order to every
//!   subscriber; interleaving *across* the two streams is unspecified.
//! - Joining a stream and snapshotting its history is atomic: no chunk is
//!   ever missed or duplicated on the backlog/live boundary.
//! - `start` succeeds at most once per process; `stop` is idempotent.

mod config;
mod core;
mod error;
mod events;
mod output;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_CHUNK_SIZE};
pub use crate::core::Supervisor;
pub use error::{StreamError, SupervisorError};
pub use output::{OutputMultiplexer, OutputReader, OutputRecord, OutputSubscription};
pub use process::{ProcessId, ProcessRequest, ProcessStatus, ResourceLimits};
pub use subscribers::Subscribe;

// Optional: expose event types.
// Enable with: `--features events`
#[cfg(feature = "events")]
pub use events::{Event, EventKind};

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
