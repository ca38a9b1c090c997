//! The process manager: configuration surface and lock state machine.

use super::guard::LockGuard;
use super::status::{CleanupReport, DomainStatus, SubjectEntry, ThreadEntry};
use crate::config::Config;
use crate::error::{ProcmanError, Result};
use crate::liveness::{LivenessProbe, Pid, SystemProbe};
use crate::sanitize::sanitize_name;
use crate::storage::StorageDriver;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Coordinates thread slots and subject ownership of one domain.
///
/// Every competing process builds its own manager against the same storage.
/// There is no shared in-memory state: the roster and owner records in the
/// [`StorageDriver`] are the only thing processes agree on.
#[derive(Debug)]
pub struct ProcessManager {
    domain: String,
    subject: Option<String>,
    capacity: usize,
    pid: Pid,
    driver: Box<dyn StorageDriver>,
    probe: Box<dyn LivenessProbe>,
}

impl ProcessManager {
    /// Create a manager for `domain` probing liveness through the OS.
    ///
    /// Capacity defaults to 1, no subject is configured and the pid is the
    /// current process's.
    ///
    /// # Errors
    ///
    /// * `ProcmanError::InvalidName` - `domain` has no alphanumeric characters
    /// * `ProcmanError::Construction` - the probe cannot see this very process,
    ///   so it could not tell live holders from dead ones either
    pub fn new(domain: &str, driver: impl StorageDriver + 'static) -> Result<Self> {
        Self::with_probe(domain, driver, SystemProbe::new())
    }

    /// Create a manager with an injected liveness probe.
    pub fn with_probe(
        domain: &str,
        driver: impl StorageDriver + 'static,
        probe: impl LivenessProbe + 'static,
    ) -> Result<Self> {
        let domain = sanitize_name("domain", domain)?;
        let pid = std::process::id();

        if !probe.is_running(pid) {
            return Err(ProcmanError::Construction(format!(
                "probe {:?} does not report the current process (pid {}) as running",
                probe, pid
            )));
        }

        debug!(domain = %domain, pid, storage = %driver.describe(), "process manager created");

        Ok(Self {
            domain,
            subject: None,
            capacity: 1,
            pid,
            driver: Box::new(driver),
            probe: Box::new(probe),
        })
    }

    /// Create a manager whose storage and default capacity come from `config`.
    pub fn from_config(domain: &str, config: &Config) -> Result<Self> {
        let driver = config.build_driver()?;
        Ok(Self::new(domain, driver)?.with_capacity(config.default_capacity))
    }

    /// Set the maximum number of concurrent slot holders.
    ///
    /// Lowering the capacity never evicts current holders; it only denies
    /// new ones until enough holders are gone.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Act on behalf of another process id.
    ///
    /// Useful for a supervisor holding locks for a child, and for simulating
    /// several processes in one test.
    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = pid;
        self
    }

    /// Configure the subject to guard. See [`ProcessManager::switch_subject`].
    pub fn with_subject(mut self, subject: &str) -> Result<Self> {
        self.switch_subject(subject)?;
        Ok(self)
    }

    /// Guard `subject` from now on.
    ///
    /// If a subject is already configured and this pid owns it, that
    /// ownership is released before switching, so a competitor can take the
    /// previous subject immediately.
    pub fn switch_subject(&mut self, subject: &str) -> Result<()> {
        let subject = sanitize_name("subject", subject)?;
        {
            let _section = self.driver.exclusive(&self.domain)?;
            self.release_subject()?;
        }
        debug!(domain = %self.domain, pid = self.pid, subject = %subject, "subject configured");
        self.subject = Some(subject);
        Ok(())
    }

    /// Release the configured subject (if owned) and stop guarding one.
    pub fn clear_subject(&mut self) -> Result<()> {
        {
            let _section = self.driver.exclusive(&self.domain)?;
            self.release_subject()?;
        }
        self.subject = None;
        Ok(())
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Storage location, as reported by the driver.
    pub fn storage(&self) -> String {
        self.driver.describe()
    }

    /// Whether `pid` is running according to this manager's probe.
    pub fn is_running(&self, pid: Pid) -> bool {
        self.probe.is_running(pid)
    }

    /// Live members of the roster.
    ///
    /// Dead entries are filtered out but not removed from storage; that
    /// happens on the next roster write (`lock`, `release`, `cleanup`).
    pub fn active_threads(&self) -> Result<Vec<Pid>> {
        let mut live: Vec<Pid> = Vec::new();
        for pid in self.driver.get_threads(&self.domain)? {
            if !live.contains(&pid) && self.probe.is_running(pid) {
                live.push(pid);
            }
        }
        Ok(live)
    }

    /// Recorded owner of `subject` in this domain, dead or alive.
    pub fn owner_of(&self, subject: &str) -> Result<Option<Pid>> {
        let subject = sanitize_name("subject", subject)?;
        self.driver.get_owner(&self.domain, &subject)
    }

    /// Try to take a slot (and the subject, if configured).
    ///
    /// Returns `false` when the domain is full, when a live process owns the
    /// subject, or when storage failed (logged). Nothing is retried.
    pub fn lock(&self) -> bool {
        match self.try_lock() {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(domain = %self.domain, pid = self.pid, error = %e, "lock attempt failed");
                false
            }
        }
    }

    /// Lock, run `work`, then release.
    ///
    /// Returns `None` without calling `work` when the lock is denied.
    pub fn lock_with<T>(&mut self, work: impl FnOnce(&mut Self) -> T) -> Option<T> {
        if !self.lock() {
            return None;
        }

        let output = work(self);

        if let Err(e) = self.release() {
            warn!(domain = %self.domain, pid = self.pid, error = %e, "failed to release after work");
        }
        Some(output)
    }

    /// Lock and hand out a guard that releases when dropped.
    pub fn acquire(&mut self) -> Option<LockGuard<'_>> {
        if self.lock() {
            Some(LockGuard::new(self))
        } else {
            None
        }
    }

    /// Give up the subject (if owned by this pid) and the thread slot.
    pub fn release(&self) -> Result<()> {
        let _section = self.driver.exclusive(&self.domain)?;
        self.release_subject()?;
        self.release_thread()?;
        info!(domain = %self.domain, pid = self.pid, "released");
        Ok(())
    }

    /// Clear dead subject owners and drop dead pids from the roster.
    pub fn cleanup(&self) -> Result<CleanupReport> {
        let _section = self.driver.exclusive(&self.domain)?;
        let reclaimed_subjects = self.reclaim_subjects()?;

        let (live, dead): (Vec<Pid>, Vec<Pid>) = self
            .driver
            .get_threads(&self.domain)?
            .into_iter()
            .partition(|&pid| self.probe.is_running(pid));

        if !dead.is_empty() {
            self.driver.set_threads(&self.domain, &live)?;
            info!(domain = %self.domain, pruned = ?dead, "pruned dead roster entries");
        }

        Ok(CleanupReport {
            reclaimed_subjects,
            pruned_threads: dead,
        })
    }

    /// Snapshot of the domain's roster and subjects.
    pub fn status(&self) -> Result<DomainStatus> {
        let threads = self
            .driver
            .get_threads(&self.domain)?
            .into_iter()
            .map(|pid| ThreadEntry {
                pid,
                running: self.probe.is_running(pid),
            })
            .collect();

        let mut subjects = Vec::new();
        for subject in self.driver.get_subjects(&self.domain)? {
            let owner = self.driver.get_owner(&self.domain, &subject)?;
            subjects.push(SubjectEntry {
                running: owner.is_some_and(|pid| self.probe.is_running(pid)),
                subject,
                owner,
            });
        }

        Ok(DomainStatus {
            domain: self.domain.clone(),
            capacity: self.capacity,
            storage: self.storage(),
            threads,
            subjects,
            checked_at: Utc::now(),
        })
    }

    /// Remove the owner record of `subject` whoever holds it.
    ///
    /// Returns the previous owner. Operator escape hatch; the lock protocol
    /// never needs it.
    pub fn force_clear_subject(&self, subject: &str) -> Result<Option<Pid>> {
        let subject = sanitize_name("subject", subject)?;
        let _section = self.driver.exclusive(&self.domain)?;
        let previous = self.driver.get_owner(&self.domain, &subject)?;
        self.driver.clear_owner(&self.domain, &subject)?;
        warn!(domain = %self.domain, subject = %subject, owner = ?previous, "subject owner force-cleared");
        Ok(previous)
    }

    /// Remove `pid` from the roster whether or not it is alive.
    ///
    /// Returns whether it was present.
    pub fn force_remove_thread(&self, pid: Pid) -> Result<bool> {
        let _section = self.driver.exclusive(&self.domain)?;
        let roster = self.driver.get_threads(&self.domain)?;
        if !roster.contains(&pid) {
            return Ok(false);
        }
        let remaining: Vec<Pid> = roster.into_iter().filter(|&p| p != pid).collect();
        self.driver.set_threads(&self.domain, &remaining)?;
        warn!(domain = %self.domain, pid, "roster entry force-removed");
        Ok(true)
    }

    fn try_lock(&self) -> Result<bool> {
        let _section = self.driver.exclusive(&self.domain)?;

        self.reclaim_subjects()?;

        if !self.lock_thread()? {
            debug!(domain = %self.domain, pid = self.pid, capacity = self.capacity, "no free thread slot");
            return Ok(false);
        }

        match self.lock_subject() {
            Ok(true) => {
                info!(
                    domain = %self.domain,
                    pid = self.pid,
                    subject = self.subject.as_deref().unwrap_or(""),
                    "lock acquired"
                );
                Ok(true)
            }
            Ok(false) => {
                debug!(
                    domain = %self.domain,
                    pid = self.pid,
                    subject = self.subject.as_deref().unwrap_or(""),
                    "subject held by a live process"
                );
                self.release_thread()?;
                Ok(false)
            }
            Err(e) => {
                if let Err(rollback) = self.release_thread() {
                    warn!(domain = %self.domain, pid = self.pid, error = %rollback, "failed to give back thread slot");
                }
                Err(e)
            }
        }
    }

    /// Clear owners of this domain's subjects whose process is gone.
    fn reclaim_subjects(&self) -> Result<Vec<String>> {
        let mut reclaimed = Vec::new();

        for subject in self.driver.get_subjects(&self.domain)? {
            // Unreadable records are left alone: a claim overwrites them anyway.
            if let Some(owner) = self.driver.get_owner(&self.domain, &subject)?
                && !self.probe.is_running(owner)
            {
                self.driver.clear_owner(&self.domain, &subject)?;
                info!(domain = %self.domain, subject = %subject, owner, "reclaimed subject of dead process");
                reclaimed.push(subject);
            }
        }

        Ok(reclaimed)
    }

    fn lock_thread(&self) -> Result<bool> {
        let mut live = self.active_threads()?;

        if live.contains(&self.pid) {
            return Ok(true);
        }

        if live.len() < self.capacity {
            live.push(self.pid);
            self.driver.set_threads(&self.domain, &live)?;
            return Ok(true);
        }

        Ok(false)
    }

    fn release_thread(&self) -> Result<()> {
        let remaining: Vec<Pid> = self
            .active_threads()?
            .into_iter()
            .filter(|&pid| pid != self.pid)
            .collect();
        self.driver.set_threads(&self.domain, &remaining)
    }

    fn lock_subject(&self) -> Result<bool> {
        let Some(subject) = self.subject.as_deref() else {
            return Ok(true);
        };

        match self.driver.get_owner(&self.domain, subject)? {
            Some(owner) if owner == self.pid => Ok(true),
            Some(owner) if self.probe.is_running(owner) => Ok(false),
            _ => {
                self.driver.set_owner(&self.domain, subject, self.pid)?;
                Ok(true)
            }
        }
    }

    fn release_subject(&self) -> Result<()> {
        if let Some(subject) = self.subject.as_deref()
            && self.driver.get_owner(&self.domain, subject)? == Some(self.pid)
        {
            self.driver.clear_owner(&self.domain, subject)?;
            debug!(domain = %self.domain, pid = self.pid, subject = %subject, "subject released");
        }
        Ok(())
    }
}
