//! # Error types used by the procvisor runtime.
//!
//! This module defines two main error enums:
//!
//! - [`SupervisorError`] errors raised by the supervisor facade and the
//!   process lifecycle state machine.
//! - [`StreamError`] errors raised by the output multiplexer.
//!
//! Both types provide helper methods `as_label` for metrics.
//!
//! [`StreamError`] is `Clone`: a single fatal read error is delivered to
//! every live subscription's error channel, so the multiplexer needs to
//! hand out independent copies of it.

use std::io;

use thiserror::Error;

/// # Errors produced by the supervisor facade and process handles.
///
/// These represent failures of the control plane: lookups, lifecycle
/// transitions, and interactions with the OS process table.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The given identifier is not present in the process registry.
    #[error("no process with id {id}")]
    UnknownProcess {
        /// The identifier that failed the lookup.
        id: String,
    },

    /// `start` was called on a handle that has already been started.
    ///
    /// Exactly one of any set of concurrent `start` calls succeeds; the
    /// rest observe this error.
    #[error("process already started")]
    AlreadyStarted,

    /// `stop` or `status` was called on a handle that was never started.
    #[error("process not started")]
    NotStarted,

    /// The OS spawn primitive failed.
    ///
    /// The handle stays startable: only a successful spawn uses up the
    /// single permitted start.
    #[error("failed to spawn process: {source}")]
    SpawnFailed {
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The spawned child did not expose one of its output pipes.
    #[error("failed to acquire {stream} pipe")]
    PipeUnavailable {
        /// Which pipe was missing (`"stdout"` or `"stderr"`).
        stream: &'static str,
    },

    /// Sending SIGKILL failed for a reason other than the process being
    /// already gone ("already gone" is suppressed and reported as success).
    #[error("failed to stop process: {source}")]
    StopFailed {
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The kernel's per-process status file could not be read or parsed.
    ///
    /// The snapshot is taken from `/proc/<pid>/stat`; the process may have
    /// been reaped, or the record may be malformed.
    #[error("process status unavailable: {reason}")]
    StatusUnavailable {
        /// Human-readable cause.
        reason: String,
    },

    /// Output multiplexer construction failed.
    #[error("output stream setup failed: {0}")]
    Stream(#[from] StreamError),
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::UnknownProcess { .. } => "unknown_process",
            SupervisorError::AlreadyStarted => "already_started",
            SupervisorError::NotStarted => "not_started",
            SupervisorError::SpawnFailed { .. } => "spawn_failed",
            SupervisorError::PipeUnavailable { .. } => "pipe_unavailable",
            SupervisorError::StopFailed { .. } => "stop_failed",
            SupervisorError::StatusUnavailable { .. } => "status_unavailable",
            SupervisorError::Stream(_) => "stream_setup_failed",
        }
    }
}

/// # Errors produced by the output multiplexer.
///
/// `NoReaders` is a construction-time error returned to the caller.
/// `ReadFailed` is asynchronous: it travels on subscriptions' error
/// channels, never on the `subscribe` return path.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The multiplexer was constructed with zero readers.
    #[error("must provide at least one output reader")]
    NoReaders,

    /// A producer hit a fatal (non-EOF) read error on its reader.
    ///
    /// Fatal for that reader only; the remaining readers keep draining.
    #[error("failed to read output: {message}")]
    ReadFailed {
        /// Stringified cause from the underlying reader.
        message: String,
    },
}

impl StreamError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::NoReaders => "stream_no_readers",
            StreamError::ReadFailed { .. } => "stream_read_failed",
        }
    }

    pub(crate) fn read_failed(source: &io::Error) -> Self {
        StreamError::ReadFailed {
            message: source.to_string(),
        }
    }
}
