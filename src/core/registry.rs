//! # Process registry: identifier -> (handle, output multiplexer).
//!
//! One entry per supervised process, inserted exactly once on successful
//! spawn. Entries are never removed in the current design; a supervisor
//! lives as long as the processes it has started are worth querying.
//!
//! ## Rules
//! - `insert` takes the write lock (exclusive), `get`/`ids` the read lock.
//! - For every identifier there is exactly one handle and exactly one
//!   multiplexer, shared out as `Arc`s.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::output::OutputMultiplexer;
use crate::process::{ProcessHandle, ProcessId};

/// Everything the supervisor keeps per process.
pub(crate) struct ProcessEntry {
    pub(crate) handle: Arc<ProcessHandle>,
    pub(crate) output: Arc<OutputMultiplexer>,
}

/// Thread-safe map of all processes this supervisor has spawned.
pub(crate) struct Registry {
    entries: RwLock<HashMap<ProcessId, Arc<ProcessEntry>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a freshly spawned process under its identifier.
    pub(crate) async fn insert(&self, id: ProcessId, entry: ProcessEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(id, Arc::new(entry));
    }

    /// Looks up a process by identifier.
    pub(crate) async fn get(&self, id: &ProcessId) -> Option<Arc<ProcessEntry>> {
        let entries = self.entries.read().await;
        entries.get(id).cloned()
    }

    /// Snapshot of every entry, for supervisor-wide operations.
    pub(crate) async fn entries(&self) -> Vec<(ProcessId, Arc<ProcessEntry>)> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect()
    }
}
