//! Runtime core: orchestration and registry.
//!
//! The only public API re-exported from here is [`Supervisor`]. Everything
//! else is an internal building block the supervisor wires together.
//!
//! ## Files & responsibilities
//! - **supervisor.rs**: public facade; owns the runtime (Bus, Registry,
//!   SubscriberSet), spawns the per-process output multiplexer and
//!   drained-watcher, publishes lifecycle events, drives shutdown.
//! - **registry.rs**: identifier -> (ProcessHandle, OutputMultiplexer);
//!   exclusive insert, shared lookup, entries never removed.
//!
//! ## Wiring (module-level flow)
//! ```text
//! Application code
//!   └─ Supervisor::start_process(request)
//!        ├─ ProcessHandle::start() ──► child + stdout/stderr pipes
//!        ├─ OutputMultiplexer::for_process(pipes) ──► producers + broadcaster
//!        ├─ watcher: multiplexer drained ──► handle.mark_finished()
//!        └─ Registry::insert(id, entry)
//!
//! Supervisor::subscribe_output(id) ──► Registry::get ──► multiplexer.subscribe()
//! Supervisor::stop_process(id)     ──► Registry::get ──► handle.stop()
//! Supervisor::get_status(id)       ──► Registry::get ──► handle.status()
//! ```

mod registry;
mod supervisor;

pub use supervisor::Supervisor;
