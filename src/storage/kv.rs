//! Key-value storage backend.

use super::{DEFAULT_PREFIX, StorageDriver, format_roster, parse_pid, parse_roster};
use crate::error::Result;
use crate::liveness::Pid;
use crate::sanitize::{sanitize, sanitize_name};
use std::collections::BTreeSet;

/// Minimal string key-value store the driver needs.
///
/// Patterns passed to [`KeyValueStore::keys`] use `*` as the only wildcard.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Human-readable location of the store.
    fn describe(&self) -> String;
}

/// Stores records as keys of a [`KeyValueStore`].
///
/// Sanitized tokens never contain `:`, so the subject scan of one domain
/// cannot pick up keys of another.
#[derive(Debug, Clone)]
pub struct KeyValueDriver<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> KeyValueDriver<S> {
    pub fn new(store: S, prefix: &str) -> Result<Self> {
        Ok(Self {
            store,
            prefix: sanitize_name("prefix", prefix)?,
        })
    }

    /// Driver using the default prefix.
    pub fn with_default_prefix(store: S) -> Self {
        Self {
            store,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the roster for `domain`.
    pub fn roster_key(&self, domain: &str) -> String {
        format!("{}:{}", self.prefix, sanitize(domain))
    }

    /// Key of the owner record for (`domain`, `subject`).
    pub fn owner_key(&self, domain: &str, subject: &str) -> String {
        format!("{}:{}:{}", self.prefix, sanitize(domain), sanitize(subject))
    }
}

impl<S: KeyValueStore> StorageDriver for KeyValueDriver<S> {
    fn get_threads(&self, domain: &str) -> Result<Vec<Pid>> {
        Ok(self
            .store
            .get(&self.roster_key(domain))?
            .map(|value| parse_roster(&value, ','))
            .unwrap_or_default())
    }

    fn set_threads(&self, domain: &str, pids: &[Pid]) -> Result<()> {
        let key = self.roster_key(domain);
        let value = format_roster(pids, ",");
        if value.is_empty() {
            return self.store.delete(&key);
        }
        self.store.set(&key, &value)
    }

    fn get_subjects(&self, domain: &str) -> Result<BTreeSet<String>> {
        let affix = format!("{}:", self.roster_key(domain));
        let keys = self.store.keys(&format!("{}*", affix))?;

        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&affix))
            .filter(|subject| !subject.is_empty() && !subject.contains(':'))
            .map(str::to_string)
            .collect())
    }

    fn get_owner(&self, domain: &str, subject: &str) -> Result<Option<Pid>> {
        Ok(self
            .store
            .get(&self.owner_key(domain, subject))?
            .and_then(|value| parse_pid(&value)))
    }

    fn set_owner(&self, domain: &str, subject: &str, pid: Pid) -> Result<()> {
        self.store
            .set(&self.owner_key(domain, subject), &pid.to_string())
    }

    fn clear_owner(&self, domain: &str, subject: &str) -> Result<()> {
        self.store.delete(&self.owner_key(domain, subject))
    }

    fn describe(&self) -> String {
        format!("{} (prefix '{}')", self.store.describe(), self.prefix)
    }
}
