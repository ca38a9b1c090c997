//! Shared storage for coordination records.
//!
//! A [`StorageDriver`] persists two kinds of records for a domain:
//! - the **roster**: pids currently holding a thread slot;
//! - one **owner** record per subject: the pid holding that subject.
//!
//! # Backends
//!
//! - [`FilesystemDriver`]: `<dir>/<prefix>-<domain>.loc` holds the roster
//!   (newline-separated pids), `<dir>/<prefix>-<domain>-<subject>.loc` the
//!   owner. Acquisition is serialised per domain with an advisory file lock.
//! - [`KeyValueDriver`]: `<prefix>:<domain>` holds the roster (comma-joined
//!   pids), `<prefix>:<domain>:<subject>` the owner. Runs on any
//!   [`KeyValueStore`]; [`MemoryStore`] ships in-process, `RedisStore` behind
//!   the `redis` feature.
//!
//! Accessors are plain reads and plain writes. Outside an
//! [`ExclusiveSection`] nothing guards a read-decide-write sequence.

mod filesystem;
mod kv;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;

#[cfg(test)]
mod tests;

pub use filesystem::FilesystemDriver;
pub use kv::{KeyValueDriver, KeyValueStore};
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use crate::error::Result;
use crate::liveness::Pid;
use std::collections::BTreeSet;

/// Namespace used when none is configured.
pub const DEFAULT_PREFIX: &str = "proc-man";

/// Persistence capabilities the process manager relies on.
pub trait StorageDriver: Send + Sync + std::fmt::Debug {
    /// Pids recorded in the roster of `domain` (empty when there is no record).
    fn get_threads(&self, domain: &str) -> Result<Vec<Pid>>;

    /// Replace the roster of `domain`. An empty slice deletes the record.
    fn set_threads(&self, domain: &str, pids: &[Pid]) -> Result<()>;

    /// Subjects of `domain` that currently have an owner record.
    fn get_subjects(&self, domain: &str) -> Result<BTreeSet<String>>;

    /// Recorded owner of (`domain`, `subject`), if any.
    fn get_owner(&self, domain: &str, subject: &str) -> Result<Option<Pid>>;

    /// Record `pid` as owner of (`domain`, `subject`).
    fn set_owner(&self, domain: &str, subject: &str, pid: Pid) -> Result<()>;

    /// Remove the owner record of (`domain`, `subject`). Missing records are fine.
    fn clear_owner(&self, domain: &str, subject: &str) -> Result<()>;

    /// Enter a cross-process critical section for `domain`.
    ///
    /// Backends without such a primitive return `Ok(None)` and the caller
    /// proceeds with plain check-then-write.
    fn exclusive(&self, _domain: &str) -> Result<Option<ExclusiveSection>> {
        Ok(None)
    }

    /// Human-readable location of the records, for logs and the CLI.
    fn describe(&self) -> String;
}

impl<D: StorageDriver + ?Sized> StorageDriver for Box<D> {
    fn get_threads(&self, domain: &str) -> Result<Vec<Pid>> {
        (**self).get_threads(domain)
    }

    fn set_threads(&self, domain: &str, pids: &[Pid]) -> Result<()> {
        (**self).set_threads(domain, pids)
    }

    fn get_subjects(&self, domain: &str) -> Result<BTreeSet<String>> {
        (**self).get_subjects(domain)
    }

    fn get_owner(&self, domain: &str, subject: &str) -> Result<Option<Pid>> {
        (**self).get_owner(domain, subject)
    }

    fn set_owner(&self, domain: &str, subject: &str, pid: Pid) -> Result<()> {
        (**self).set_owner(domain, subject, pid)
    }

    fn clear_owner(&self, domain: &str, subject: &str) -> Result<()> {
        (**self).clear_owner(domain, subject)
    }

    fn exclusive(&self, domain: &str) -> Result<Option<ExclusiveSection>> {
        (**self).exclusive(domain)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A held cross-process critical section. Leaving it is dropping it.
pub struct ExclusiveSection {
    _held: Box<dyn Send>,
}

impl ExclusiveSection {
    /// Wrap whatever keeps the section held (a locked file handle, a lease...).
    pub fn new(held: impl Send + 'static) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for ExclusiveSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveSection").finish_non_exhaustive()
    }
}

/// Parse one stored pid. Blank, malformed and zero values read as `None`.
pub(crate) fn parse_pid(raw: &str) -> Option<Pid> {
    match raw.trim().parse::<Pid>() {
        Ok(0) | Err(_) => None,
        Ok(pid) => Some(pid),
    }
}

/// Parse a stored roster, skipping entries that are not valid pids.
pub(crate) fn parse_roster(raw: &str, separator: char) -> Vec<Pid> {
    raw.split(separator).filter_map(parse_pid).collect()
}

/// Render a roster for storage. Zero pids are dropped.
pub(crate) fn format_roster(pids: &[Pid], separator: &str) -> String {
    pids.iter()
        .filter(|&&pid| pid != 0)
        .map(|pid| pid.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
