//! Scripted liveness probe.

use super::{LivenessProbe, Pid};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// A probe whose answers come from a shared set of "running" pids.
///
/// Clones share the same set, so every manager in a test sees the same
/// simulated process table.
#[derive(Debug, Clone, Default)]
pub struct FakeProbe {
    running: Arc<Mutex<BTreeSet<Pid>>>,
}

impl FakeProbe {
    /// Create a probe where no process is running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a probe where exactly `pids` are running.
    pub fn with_running(pids: impl IntoIterator<Item = Pid>) -> Self {
        let probe = Self::new();
        probe.table().extend(pids);
        probe
    }

    /// Mark `pid` as running.
    pub fn spawn(&self, pid: Pid) {
        self.table().insert(pid);
    }

    /// Mark `pid` as terminated.
    pub fn kill(&self, pid: Pid) {
        self.table().remove(&pid);
    }

    /// Snapshot of the pids currently considered running.
    pub fn running(&self) -> Vec<Pid> {
        self.table().iter().copied().collect()
    }

    fn table(&self) -> MutexGuard<'_, BTreeSet<Pid>> {
        self.running
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl LivenessProbe for FakeProbe {
    fn is_running(&self, pid: Pid) -> bool {
        self.table().contains(&pid)
    }
}
