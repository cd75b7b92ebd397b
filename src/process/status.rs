//! # Point-in-time process status snapshots.
//!
//! The kernel state is read from `/proc/<pid>/stat` at snapshot time. The
//! snapshot is not a long-lived observer: the OS may change the real state
//! the instant after the file is read.
//!
//! ## Stat record format
//! ```text
//! 1234 (comm) S 1 1234 ...
//!      └────┘ └┘
//!   image name state
//! ```
//! The image name may itself contain parentheses and whitespace, so the
//! parser skips to the **last** `)` before taking the state field.

use std::time::SystemTime;

use crate::error::SupervisorError;

/// Snapshot of a supervised process at one instant.
#[derive(Clone, Debug)]
pub struct ProcessStatus {
    /// OS pid of the child.
    pub pid: u32,
    /// Identity that requested the process.
    pub started_by: String,
    /// Kernel state code: `R` (runnable), `D` (uninterruptible sleep),
    /// `S` (interruptible sleep), `T` (stopped), `Z` (zombie).
    pub state: char,
    /// When the child was successfully spawned.
    pub started_at: SystemTime,
    /// When the child's output streams were fully drained, if they have
    /// been.
    pub finished_at: Option<SystemTime>,
}

/// Reads the kernel state code for `pid` from its proc stat record.
pub(crate) async fn kernel_state(pid: u32) -> Result<char, SupervisorError> {
    let path = format!("/proc/{pid}/stat");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|err| SupervisorError::StatusUnavailable {
            reason: format!("{path}: {err}"),
        })?;
    parse_state(&raw).ok_or_else(|| SupervisorError::StatusUnavailable {
        reason: format!("malformed stat record for pid {pid}"),
    })
}

/// Extracts the state character from a raw stat record.
fn parse_state(raw: &str) -> Option<char> {
    let comm_end = raw.rfind(')')?;
    raw[comm_end + 1..].split_whitespace().next()?.chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_record() {
        let raw = "1234 (sleep) S 1 1234 1234 0 -1 4194560 120 0 0 0\n";
        assert_eq!(parse_state(raw), Some('S'));
    }

    #[test]
    fn image_names_with_parens_and_spaces_do_not_confuse_it() {
        let raw = "77 (weird (name) a) b) R 1 77 77 0 -1\n";
        assert_eq!(parse_state(raw), Some('R'));
    }

    #[test]
    fn zombie_state_is_extracted() {
        let raw = "99 (defunct) Z 1 99 99 0 -1\n";
        assert_eq!(parse_state(raw), Some('Z'));
    }

    #[test]
    fn truncated_records_are_rejected() {
        assert_eq!(parse_state("1234 (sleep"), None);
        assert_eq!(parse_state("1234 (sleep)"), None);
        assert_eq!(parse_state(""), None);
    }
}
