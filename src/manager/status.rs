//! Snapshots and reports produced by the process manager.

use crate::liveness::Pid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One roster entry and whether its process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub pid: Pid,
    pub running: bool,
}

/// One subject record of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    /// Sanitized subject name.
    pub subject: String,

    /// Recorded owner (`None` when the record is unreadable).
    pub owner: Option<Pid>,

    /// Whether the owner is running.
    pub running: bool,
}

/// State of a domain as seen by one manager at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainStatus {
    pub domain: String,

    /// Capacity of the manager that took the snapshot.
    pub capacity: usize,

    /// Storage location.
    pub storage: String,

    /// Roster entries, including dead ones not yet pruned.
    pub threads: Vec<ThreadEntry>,

    /// Subject records, including ones whose owner is dead.
    pub subjects: Vec<SubjectEntry>,

    pub checked_at: DateTime<Utc>,
}

impl DomainStatus {
    /// Number of roster entries whose process is running.
    pub fn active_count(&self) -> usize {
        self.threads.iter().filter(|t| t.running).count()
    }

    /// Whether a new process would currently be denied a slot.
    pub fn is_full(&self) -> bool {
        self.active_count() >= self.capacity
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Domain:   {}", self.domain)?;
        writeln!(f, "Storage:  {}", self.storage)?;
        writeln!(
            f,
            "Threads:  {}/{}{}",
            self.active_count(),
            self.capacity,
            if self.is_full() { " (full)" } else { "" }
        )?;
        for thread in &self.threads {
            writeln!(
                f,
                "  {}{}",
                thread.pid,
                if thread.running { "" } else { " (dead)" }
            )?;
        }

        if self.subjects.is_empty() {
            write!(f, "Subjects: none")
        } else {
            write!(f, "Subjects: {}", self.subjects.len())?;
            for entry in &self.subjects {
                let owner = entry
                    .owner
                    .map(|pid| pid.to_string())
                    .unwrap_or_else(|| "?".to_string());
                write!(
                    f,
                    "\n  {} -> {}{}",
                    entry.subject,
                    owner,
                    if entry.running { "" } else { " (stale)" }
                )?;
            }
            Ok(())
        }
    }
}

/// Outcome of an explicit cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Subjects whose dead owner was cleared.
    pub reclaimed_subjects: Vec<String>,

    /// Dead pids removed from the roster.
    pub pruned_threads: Vec<Pid>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.reclaimed_subjects.is_empty() && self.pruned_threads.is_empty()
    }
}

impl std::fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "Nothing to clean up.");
        }
        write!(
            f,
            "Reclaimed {} subject(s), pruned {} dead thread(s)",
            self.reclaimed_subjects.len(),
            self.pruned_threads.len()
        )?;
        for subject in &self.reclaimed_subjects {
            write!(f, "\n  subject {}", subject)?;
        }
        for pid in &self.pruned_threads {
            write!(f, "\n  pid {}", pid)?;
        }
        Ok(())
    }
}
