//! Filesystem storage backend.

use super::{
    DEFAULT_PREFIX, ExclusiveSection, StorageDriver, format_roster, parse_pid, parse_roster,
};
use crate::error::{ProcmanError, Result};
use crate::fs::atomic_write_file;
use crate::liveness::Pid;
use crate::sanitize::{sanitize, sanitize_name};
use fs2::FileExt;
use globset::{Glob, GlobMatcher};
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = ".loc";
const MUTEX_EXTENSION: &str = ".mutex";

/// Stores records as small files in one directory.
///
/// Any number of processes may point at the same directory; processes using a
/// different prefix never see each other's records.
///
/// Names are joined with `-`, so the owner record of subject `b` in domain
/// `a` and the roster of domain `a-b` are the same file. Within one prefix,
/// avoid domain names that extend another domain's name with `-`.
///
/// Each domain ever locked leaves an empty `<prefix>-<domain>.mutex` file
/// behind. It is never removed: a process may be blocked on it, and
/// unlinking it would let the next locker take a fresh file's lock.
#[derive(Debug, Clone)]
pub struct FilesystemDriver {
    dir: PathBuf,
    prefix: String,
}

impl FilesystemDriver {
    /// Create a driver storing records under `dir`, creating it if missing.
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let dir = dir.into();
        let prefix = sanitize_name("prefix", prefix)?;

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                ProcmanError::storage(
                    format!("failed to create storage directory '{}'", dir.display()),
                    e,
                )
            })?;
        }

        Ok(Self { dir, prefix })
    }

    /// Driver in the system temp directory with the default prefix.
    pub fn in_temp_dir() -> Result<Self> {
        Self::new(std::env::temp_dir(), DEFAULT_PREFIX)
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sanitized namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the roster file for `domain`.
    pub fn roster_path(&self, domain: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}{}",
            self.prefix,
            sanitize(domain),
            RECORD_EXTENSION
        ))
    }

    /// Path of the owner file for (`domain`, `subject`).
    pub fn owner_path(&self, domain: &str, subject: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}-{}{}",
            self.prefix,
            sanitize(domain),
            sanitize(subject),
            RECORD_EXTENSION
        ))
    }

    fn mutex_path(&self, domain: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}{}",
            self.prefix,
            sanitize(domain),
            MUTEX_EXTENSION
        ))
    }

    /// File-name prefix shared by every owner record of `domain`.
    fn subject_affix(&self, domain: &str) -> String {
        format!("{}-{}-", self.prefix, sanitize(domain))
    }

    fn subject_matcher(&self, domain: &str) -> Result<GlobMatcher> {
        let pattern = format!("{}*{}", self.subject_affix(domain), RECORD_EXTENSION);
        Glob::new(&pattern)
            .map(|glob| glob.compile_matcher())
            .map_err(|e| ProcmanError::storage(format!("invalid subject pattern '{}'", pattern), e))
    }

    fn read_record(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProcmanError::storage(
                format!("failed to read '{}'", path.display()),
                e,
            )),
        }
    }

    fn remove_record(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProcmanError::storage(
                format!("failed to remove '{}'", path.display()),
                e,
            )),
        }
    }
}

impl StorageDriver for FilesystemDriver {
    fn get_threads(&self, domain: &str) -> Result<Vec<Pid>> {
        Ok(self
            .read_record(&self.roster_path(domain))?
            .map(|content| parse_roster(&content, '\n'))
            .unwrap_or_default())
    }

    fn set_threads(&self, domain: &str, pids: &[Pid]) -> Result<()> {
        let path = self.roster_path(domain);
        let content = format_roster(pids, "\n");
        if content.is_empty() {
            return self.remove_record(&path);
        }
        atomic_write_file(&path, &content)
    }

    fn get_subjects(&self, domain: &str) -> Result<BTreeSet<String>> {
        let matcher = self.subject_matcher(domain)?;
        let affix = self.subject_affix(domain);

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => {
                return Err(ProcmanError::storage(
                    format!("failed to list '{}'", self.dir.display()),
                    e,
                ));
            }
        };

        let mut subjects = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ProcmanError::storage(
                    format!("failed to list '{}'", self.dir.display()),
                    e,
                )
            })?;

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !matcher.is_match(name) {
                continue;
            }

            let subject = name
                .strip_prefix(&affix)
                .and_then(|rest| rest.strip_suffix(RECORD_EXTENSION));
            if let Some(subject) = subject
                && !subject.is_empty()
            {
                subjects.insert(subject.to_string());
            }
        }

        Ok(subjects)
    }

    fn get_owner(&self, domain: &str, subject: &str) -> Result<Option<Pid>> {
        Ok(self
            .read_record(&self.owner_path(domain, subject))?
            .and_then(|content| parse_pid(&content)))
    }

    fn set_owner(&self, domain: &str, subject: &str, pid: Pid) -> Result<()> {
        atomic_write_file(self.owner_path(domain, subject), &pid.to_string())
    }

    fn clear_owner(&self, domain: &str, subject: &str) -> Result<()> {
        self.remove_record(&self.owner_path(domain, subject))
    }

    fn exclusive(&self, domain: &str) -> Result<Option<ExclusiveSection>> {
        let path = self.mutex_path(domain);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                ProcmanError::storage(format!("failed to open '{}'", path.display()), e)
            })?;

        // Held only around acquisition, so blocking here is short.
        file.lock_exclusive().map_err(|e| {
            ProcmanError::storage(format!("failed to lock '{}'", path.display()), e)
        })?;

        // Closing the handle releases the lock.
        Ok(Some(ExclusiveSection::new(file)))
    }

    fn describe(&self) -> String {
        format!("{} (prefix '{}')", self.dir.display(), self.prefix)
    }
}
