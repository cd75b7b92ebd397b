//! # Process handle: lifecycle state machine for one child.
//!
//! [`ProcessHandle`] owns the spawned child and enforces the lifecycle
//! contract:
//!
//! ```text
//! NotStarted ──start()──► Running ──stop()──► Stopped
//!     ▲  │                              ▲       │
//!     └──┘ failed spawn                 └─stop()┘ (idempotent)
//! ```
//!
//! ## Rules
//! - `start` succeeds **at most once**; of N concurrent calls exactly one
//!   wins, the rest fail with `AlreadyStarted`. A *failed* spawn leaves the
//!   handle startable.
//! - `stop` sends SIGKILL and is idempotent; "the process is already gone"
//!   is success. The child is never reaped here, so its proc entry stays
//!   readable for `status` (it lingers as a zombie until the supervisor
//!   exits).
//! - `status` snapshots the kernel state at call time; it requires a
//!   started handle.
//! - All transitions run under one mutex; the OS may of course change the
//!   real process state at any instant regardless.

use std::io;
use std::process::Stdio;
use std::time::SystemTime;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::SupervisorError;
use crate::process::request::ProcessRequest;
use crate::process::status::{self, ProcessStatus};

/// ESRCH: the pid no longer exists in the process table.
const NO_SUCH_PROCESS: i32 = 3;

/// Where the handle is in its one-way lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    NotStarted,
    Running,
    Stopped,
}

/// Mutable half of the handle, guarded by one mutex.
struct HandleState {
    lifecycle: Lifecycle,
    /// The live OS child; present from the first successful `start` on.
    child: Option<Child>,
    /// Captured at spawn; survives even after the child exits.
    pid: Option<u32>,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
}

/// Owns one supervised child process.
pub(crate) struct ProcessHandle {
    program: String,
    args: Vec<String>,
    requested_by: String,
    state: Mutex<HandleState>,
}

impl ProcessHandle {
    pub(crate) fn new(request: &ProcessRequest) -> Self {
        Self {
            program: request.command.clone(),
            args: request.args.clone(),
            requested_by: request.requested_by.clone(),
            state: Mutex::new(HandleState {
                lifecycle: Lifecycle::NotStarted,
                child: None,
                pid: None,
                started_at: None,
                finished_at: None,
            }),
        }
    }

    /// Spawns the child and hands back its output pipes.
    ///
    /// ### Contract
    /// - Succeeds at most once; concurrent callers race for the single
    ///   `NotStarted -> Running` transition.
    /// - On spawn failure the handle remains `NotStarted` and startable.
    pub(crate) async fn start(&self) -> Result<(ChildStdout, ChildStderr), SupervisorError> {
        let mut state = self.state.lock().await;
        if state.lifecycle != Lifecycle::NotStarted {
            return Err(SupervisorError::AlreadyStarted);
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SupervisorError::SpawnFailed { source })?;

        let stdout = match child.stdout.take() {
            Some(pipe) => pipe,
            None => {
                let _ = child.start_kill();
                return Err(SupervisorError::PipeUnavailable { stream: "stdout" });
            }
        };
        let stderr = match child.stderr.take() {
            Some(pipe) => pipe,
            None => {
                let _ = child.start_kill();
                return Err(SupervisorError::PipeUnavailable { stream: "stderr" });
            }
        };

        state.pid = child.id();
        state.started_at = Some(SystemTime::now());
        state.child = Some(child);
        state.lifecycle = Lifecycle::Running;
        Ok((stdout, stderr))
    }

    /// Sends SIGKILL to the child.
    ///
    /// Idempotent: any number of sequential or concurrent calls on a
    /// started handle succeed, including after the child has already
    /// exited. Fails with `NotStarted` before the first start.
    pub(crate) async fn stop(&self) -> Result<(), SupervisorError> {
        let mut state = self.state.lock().await;
        match state.lifecycle {
            Lifecycle::NotStarted => Err(SupervisorError::NotStarted),
            Lifecycle::Running | Lifecycle::Stopped => {
                if let Some(child) = state.child.as_mut() {
                    match child.start_kill() {
                        Ok(()) => {}
                        Err(err) if is_already_gone(&err) => {}
                        Err(source) => return Err(SupervisorError::StopFailed { source }),
                    }
                }
                state.lifecycle = Lifecycle::Stopped;
                Ok(())
            }
        }
    }

    /// Takes a point-in-time status snapshot of the child.
    pub(crate) async fn status(&self) -> Result<ProcessStatus, SupervisorError> {
        let state = self.state.lock().await;
        if state.lifecycle == Lifecycle::NotStarted {
            return Err(SupervisorError::NotStarted);
        }
        let (Some(pid), Some(started_at)) = (state.pid, state.started_at) else {
            return Err(SupervisorError::NotStarted);
        };

        let kernel = status::kernel_state(pid).await?;
        Ok(ProcessStatus {
            pid,
            started_by: self.requested_by.clone(),
            state: kernel,
            started_at,
            finished_at: state.finished_at,
        })
    }

    /// OS pid of the child, once started.
    pub(crate) async fn pid(&self) -> Option<u32> {
        self.state.lock().await.pid
    }

    /// Records the moment the child's output streams were fully drained.
    ///
    /// First call wins; the lifecycle is not affected.
    pub(crate) async fn mark_finished(&self) {
        let mut state = self.state.lock().await;
        if state.finished_at.is_none() {
            state.finished_at = Some(SystemTime::now());
        }
    }
}

/// Kill errors that mean the process is already gone and stop must still
/// report success.
fn is_already_gone(err: &io::Error) -> bool {
    // tokio reports a kill on an already-reaped child as InvalidInput; a
    // raw ESRCH means the pid vanished from the process table.
    err.kind() == io::ErrorKind::InvalidInput || err.raw_os_error() == Some(NO_SUCH_PROCESS)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;
    use crate::process::request::ResourceLimits;

    fn request(program: &str, args: &[&str]) -> ProcessRequest {
        ProcessRequest {
            command: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            requested_by: "some_user".to_string(),
            resource_limits: ResourceLimits::default(),
        }
    }

    #[tokio::test]
    async fn status_before_start_fails() {
        let handle = ProcessHandle::new(&request("sleep", &["10"]));
        let err = handle.status().await.unwrap_err();
        assert!(matches!(err, SupervisorError::NotStarted));
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let handle = ProcessHandle::new(&request("echo", &["hello"]));
        let err = handle.stop().await.unwrap_err();
        assert!(matches!(err, SupervisorError::NotStarted));
    }

    #[tokio::test]
    async fn start_twice_sequential_is_rejected() {
        let handle = ProcessHandle::new(&request("echo", &["hello"]));
        handle.start().await.expect("first start");
        let err = handle.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::AlreadyStarted));
    }

    #[tokio::test]
    async fn concurrent_starts_admit_exactly_one() {
        let handle = Arc::new(ProcessHandle::new(&request("echo", &["hello"])));

        let attempts = (0..10).map(|_| {
            let handle = Arc::clone(&handle);
            async move { handle.start().await }
        });
        let results = join_all(attempts).await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(SupervisorError::AlreadyStarted)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(rejected, 9);
    }

    #[tokio::test]
    async fn restart_after_stop_is_rejected() {
        let handle = ProcessHandle::new(&request("sleep", &["10"]));
        handle.start().await.expect("start");
        handle.stop().await.expect("stop");
        let err = handle.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::AlreadyStarted));
    }

    #[tokio::test]
    async fn stop_twice_sequential_succeeds() {
        let handle = ProcessHandle::new(&request("echo", &["hello"]));
        handle.start().await.expect("start");
        handle.stop().await.expect("first stop");
        handle.stop().await.expect("second stop");
    }

    #[tokio::test]
    async fn concurrent_stops_all_succeed() {
        let handle = Arc::new(ProcessHandle::new(&request("sleep", &["10"])));
        handle.start().await.expect("start");

        let attempts = (0..10).map(|_| {
            let handle = Arc::clone(&handle);
            async move { handle.stop().await }
        });
        let results = join_all(attempts).await;
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn status_reflects_a_running_child() {
        let handle = ProcessHandle::new(&request("sleep", &["10"]));
        handle.start().await.expect("start");

        let status = handle.status().await.expect("status");
        assert_eq!(status.pid, handle.pid().await.expect("pid"));
        assert_eq!(status.started_by, "some_user");
        // Freshly spawned: still runnable, or already parked in its sleep.
        assert!(matches!(status.state, 'R' | 'S'));
        assert!(status.finished_at.is_none());

        handle.stop().await.expect("cleanup");
    }

    #[tokio::test]
    async fn failed_spawn_keeps_the_handle_startable() {
        let handle = ProcessHandle::new(&request("/definitely/not/a/binary", &[]));

        let first = handle.start().await.unwrap_err();
        assert!(matches!(first, SupervisorError::SpawnFailed { .. }));

        // The failure did not use up the single permitted start.
        let second = handle.start().await.unwrap_err();
        assert!(matches!(second, SupervisorError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn mark_finished_is_first_write_wins() {
        let handle = ProcessHandle::new(&request("echo", &["hello"]));
        handle.start().await.expect("start");

        handle.mark_finished().await;
        let first = handle.status().await.expect("status").finished_at;
        handle.mark_finished().await;
        let second = handle.status().await.expect("status").finished_at;

        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
