//! # Supervised process primitives.
//!
//! - [`ProcessId`] - opaque registry identifier
//! - [`ProcessRequest`] / [`ResourceLimits`] - what to execute, for whom
//! - [`ProcessStatus`] - point-in-time snapshot
//! - `ProcessHandle` - internal lifecycle state machine (start-once,
//!   stop-idempotent), wired by the supervisor

mod handle;
mod id;
mod request;
mod status;

pub(crate) use handle::ProcessHandle;
pub use id::ProcessId;
pub use request::{ProcessRequest, ResourceLimits};
pub use status::ProcessStatus;
