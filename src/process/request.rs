//! # Process execution requests.

/// A request to execute a Linux process under supervision.
#[derive(Clone, Debug)]
pub struct ProcessRequest {
    /// The program to execute.
    pub command: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Identity of the caller requesting the execution.
    ///
    /// Recorded verbatim and echoed in status snapshots; the library does
    /// not interpret it.
    pub requested_by: String,

    /// Resources the process will have access to.
    ///
    /// These translate to cgroup interface files configuration in the
    /// resource-control layer above this crate; the core records them
    /// without applying them.
    pub resource_limits: ResourceLimits,
}

/// Resource limits attached to a process request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Upper bound on resident memory, in bytes. `None` means unlimited.
    pub max_memory_bytes: Option<u64>,
}
