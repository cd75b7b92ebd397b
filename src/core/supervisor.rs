//! # Supervisor: the public entry point.
//!
//! The [`Supervisor`] owns the runtime components (event bus, registry,
//! subscriber fan-out) and orchestrates each process from spawn to the end
//! of its output streams.
//!
//! ## Architecture
//! ```text
//! start_process(request)
//!     ├──► ProcessHandle::start()      fork+exec, take stdout/stderr pipes
//!     ├──► OutputMultiplexer           drains both pipes from byte zero
//!     ├──► watcher task                drained → handle.mark_finished()
//!     ├──► Registry::insert(id, ...)
//!     └──► returns ProcessId
//!
//! stop_process(id)      ──► lookup ──► handle.stop()      (SIGKILL)
//! get_status(id)        ──► lookup ──► handle.status()    (/proc snapshot)
//! subscribe_output(id)  ──► lookup ──► multiplexer.subscribe()
//! shutdown()            ──► SIGKILL every registered process
//! ```
//!
//! ## Rules
//! - One handle and one multiplexer per identifier, for the supervisor's
//!   whole lifetime; registry entries are never removed.
//! - Lifecycle events are published to the bus and fanned out to the
//!   [`Subscribe`]rs passed at construction; with no subscribers the
//!   events are dropped silently.
//! - Construction requires a running Tokio runtime.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::core::registry::{ProcessEntry, Registry};
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind};
use crate::output::{OutputMultiplexer, OutputReader, OutputSubscription};
use crate::process::{ProcessHandle, ProcessId, ProcessRequest, ProcessStatus};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Linux process manager: spawns children, tracks their lifecycle, and
/// streams their combined output to any number of late-joining
/// subscribers.
///
/// ```no_run
/// use procvisor::{Config, ProcessRequest, ResourceLimits, Supervisor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let supervisor = Supervisor::new(Config::default());
///
///     let id = supervisor
///         .start_process(ProcessRequest {
///             command: "bash".into(),
///             args: vec!["-c".into(), "for i in 1 2 3; do echo \"Hi, $i\"; done".into()],
///             requested_by: "hashi".into(),
///             resource_limits: ResourceLimits::default(),
///         })
///         .await?;
///
///     let mut output = supervisor.subscribe_output(&id).await?;
///     while let Some(record) = output.recv().await {
///         print!("{}", String::from_utf8_lossy(&record.content));
///     }
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    /// Global runtime configuration.
    cfg: Config,
    /// Event bus shared with every multiplexer.
    bus: Bus,
    /// All processes this supervisor has spawned.
    registry: Arc<Registry>,
}

impl Supervisor {
    /// Creates a supervisor with no event subscribers.
    pub fn new(cfg: Config) -> Self {
        Self::with_subscribers(cfg, Vec::new())
    }

    /// Creates a supervisor that fans runtime events out to `subscribers`.
    pub fn with_subscribers(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        if !subscribers.is_empty() {
            spawn_event_listener(&bus, SubscriberSet::new(subscribers, bus.clone()));
        }

        Self {
            cfg,
            bus,
            registry: Arc::new(Registry::new()),
        }
    }

    /// Starts a new process and registers it.
    ///
    /// Does not wait for the process to terminate. The returned identifier
    /// is the key for every other operation.
    ///
    /// ### Errors
    /// - [`SupervisorError::SpawnFailed`] when the OS rejects the exec
    /// - [`SupervisorError::PipeUnavailable`] when an output pipe is missing
    pub async fn start_process(
        &self,
        request: ProcessRequest,
    ) -> Result<ProcessId, SupervisorError> {
        let handle = Arc::new(ProcessHandle::new(&request));
        let (stdout, stderr) = handle.start().await?;

        let id = ProcessId::generate();
        let readers: Vec<OutputReader> = vec![Box::new(stdout), Box::new(stderr)];
        let output = Arc::new(OutputMultiplexer::for_process(
            readers,
            self.cfg.chunk_size_clamped(),
            self.bus.clone(),
            &id,
        )?);

        watch_drained(Arc::clone(&handle), Arc::clone(&output));

        let pid = handle.pid().await;
        self.registry
            .insert(id.clone(), ProcessEntry { handle, output })
            .await;

        let mut ev = Event::now(EventKind::ProcessSpawned).with_process(id.as_str());
        if let Some(pid) = pid {
            ev = ev.with_pid(pid);
        }
        self.bus.publish(ev);

        Ok(id)
    }

    /// Stops a process with SIGKILL.
    ///
    /// Idempotent: stopping an already-stopped or already-exited process
    /// succeeds.
    pub async fn stop_process(&self, id: &ProcessId) -> Result<(), SupervisorError> {
        let entry = self.lookup(id).await?;
        entry.handle.stop().await?;

        let mut ev = Event::now(EventKind::ProcessStopped).with_process(id.as_str());
        if let Some(pid) = entry.handle.pid().await {
            ev = ev.with_pid(pid);
        }
        self.bus.publish(ev);
        Ok(())
    }

    /// Takes a point-in-time status snapshot of a process.
    pub async fn get_status(&self, id: &ProcessId) -> Result<ProcessStatus, SupervisorError> {
        let entry = self.lookup(id).await?;
        entry.handle.status().await
    }

    /// Subscribes to the combined stdout/stderr of a process.
    ///
    /// The subscription receives the full history from byte zero (as one
    /// backlog record) followed by a live tail; it works the same before
    /// the child writes anything, mid-stream, and after it has exited.
    pub async fn subscribe_output(
        &self,
        id: &ProcessId,
    ) -> Result<OutputSubscription, SupervisorError> {
        let entry = self.lookup(id).await?;
        let subscription = entry.output.subscribe().await;

        self.bus
            .publish(Event::now(EventKind::OutputSubscribed).with_process(id.as_str()));
        Ok(subscription)
    }

    /// Sends SIGKILL to every process this supervisor has started,
    /// best-effort.
    ///
    /// Output subscriptions close on their own once the killed children's
    /// pipes reach EOF. Registry entries stay queryable.
    pub async fn shutdown(&self) {
        self.bus.publish(Event::now(EventKind::ShutdownRequested));

        for (id, entry) in self.registry.entries().await {
            if entry.handle.stop().await.is_ok() {
                self.bus
                    .publish(Event::now(EventKind::ProcessStopped).with_process(id.as_str()));
            }
        }
    }

    async fn lookup(&self, id: &ProcessId) -> Result<Arc<ProcessEntry>, SupervisorError> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| SupervisorError::UnknownProcess { id: id.to_string() })
    }
}

/// Forwards bus events to the subscriber set until the bus closes.
fn spawn_event_listener(bus: &Bus, set: SubscriberSet) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit_arc(Arc::new(ev)),
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    });
}

/// Records `finished_at` on the handle once both pipes have been drained.
fn watch_drained(handle: Arc<ProcessHandle>, output: Arc<OutputMultiplexer>) {
    tokio::spawn(async move {
        output.drained().await;
        handle.mark_finished().await;
    });
}
